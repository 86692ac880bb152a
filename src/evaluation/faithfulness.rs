// file: src/evaluation/faithfulness.rs
// description: LLM-as-judge faithfulness scoring over an OpenAI-compatible chat completions API
// reference: https://platform.openai.com/docs/api-reference/chat/create

use super::FaithfulnessScorer;
use crate::config::EvaluatorConfig;
use crate::error::{PipelineError, Result};
use crate::models::EvaluationResult;
use crate::utils::Validator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const INSTRUCTIONS: &str = "Your task is to judge the faithfulness or groundedness of statements based \
on context information. First, extract the statements made in the provided predicted answer to a \
question. Second, give every statement a score: 1 if the statement can be inferred from the provided \
context, 0 if it cannot.";

const OUTPUT_KEYS: [&str; 2] = ["statements", "statement_scores"];

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
    response_format: Value,
    seed: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct Judgement {
    statements: Vec<String>,
    statement_scores: Vec<Value>,
}

pub struct FaithfulnessEvaluator {
    client: Client,
    config: EvaluatorConfig,
}

impl FaithfulnessEvaluator {
    pub fn new(config: EvaluatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn build_prompt(question: &str, contexts: &[String], predicted_answer: &str) -> String {
        let examples = [
            (
                json!({
                    "questions": "What is the capital of Germany and when was it founded?",
                    "contexts": ["Berlin is the capital of Germany and was founded in 1244."],
                    "predicted_answers": "The capital of Germany, Berlin, was founded in the 13th century."
                }),
                json!({
                    "statements": [
                        "Berlin is the capital of Germany.",
                        "Berlin was founded in 1244."
                    ],
                    "statement_scores": [1, 1]
                }),
            ),
            (
                json!({
                    "questions": "What is the capital of France?",
                    "contexts": ["Berlin is the capital of Germany."],
                    "predicted_answers": "Paris"
                }),
                json!({
                    "statements": ["Paris is the capital of France."],
                    "statement_scores": [0]
                }),
            ),
        ];

        let mut prompt = format!(
            "Instructions:\n{}\n\nGenerate the response in JSON format with the following keys:\n{}\n\
             Consider the instructions and the examples below to determine those values.\n\nExamples:\n",
            INSTRUCTIONS,
            json!(OUTPUT_KEYS)
        );

        for (inputs, outputs) in &examples {
            prompt.push_str(&format!("Inputs:\n{}\nOutputs:\n{}\n", inputs, outputs));
        }

        let inputs = json!({
            "questions": question,
            "contexts": contexts,
            "predicted_answers": predicted_answer,
        });
        prompt.push_str(&format!("Inputs:\n{}\nOutputs:\n", inputs));
        prompt
    }

    /// Turns the judge's raw reply into a scored result.
    pub fn parse_judgement(
        question: &str,
        predicted_answer: &str,
        reply: &str,
    ) -> Result<EvaluationResult> {
        let value: Value = serde_json::from_str(strip_code_fence(reply)).map_err(|e| {
            PipelineError::Validation(format!("Judge reply is not valid JSON: {}", e))
        })?;

        if let Some(missing) = OUTPUT_KEYS.iter().find(|key| value.get(**key).is_none()) {
            return Err(PipelineError::Validation(format!(
                "Judge reply is missing the expected key '{}'",
                missing
            )));
        }

        let judgement: Judgement = serde_json::from_value(value).map_err(|e| {
            PipelineError::Validation(format!("Judge reply has unexpected shape: {}", e))
        })?;

        if judgement.statements.len() != judgement.statement_scores.len() {
            return Err(PipelineError::Validation(format!(
                "Judge returned {} statements but {} scores",
                judgement.statements.len(),
                judgement.statement_scores.len()
            )));
        }

        let statement_scores = judgement
            .statement_scores
            .iter()
            .map(|score| match score.as_f64() {
                Some(s) if s == 0.0 => Ok(0u8),
                Some(s) if s == 1.0 => Ok(1u8),
                _ => Err(PipelineError::Validation(format!(
                    "Statement score must be 0 or 1, got {}",
                    score
                ))),
            })
            .collect::<Result<Vec<u8>>>()?;

        let score = if statement_scores.is_empty() {
            0.0
        } else {
            statement_scores.iter().map(|&s| s as f64).sum::<f64>() / statement_scores.len() as f64
        };

        Ok(EvaluationResult {
            query: question.to_string(),
            predicted_answer: predicted_answer.to_string(),
            score,
            statements: judgement.statements,
            statement_scores,
        })
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base_url.trim_end_matches('/')
        );
        let request = CompletionRequest {
            model: &self.config.model,
            messages: vec![CompletionMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            response_format: json!({"type": "json_object"}),
            seed: 42,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Evaluation(format!("Failed to send evaluation request: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Evaluation(format!(
                "Evaluation request failed with status {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            PipelineError::Evaluation(format!("Failed to parse evaluation response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Evaluation("Judge returned no choices".to_string()))
    }
}

#[async_trait]
impl FaithfulnessScorer for FaithfulnessEvaluator {
    async fn score(
        &self,
        question: &str,
        contexts: &[String],
        predicted_answer: &str,
    ) -> Result<EvaluationResult> {
        Validator::validate_content_not_empty("Question", question)?;
        Validator::validate_content_not_empty("Predicted answer", predicted_answer)?;

        let prompt = Self::build_prompt(question, contexts, predicted_answer);
        let reply = self.complete(prompt).await?;
        debug!("Judge reply: {}", reply);

        Self::parse_judgement(question, predicted_answer, &reply)
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
