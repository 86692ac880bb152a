// file: src/generation/answer.rs
// description: packages a model reply and its supporting documents into a generated answer

use super::message::ChatMessage;
use crate::config::LlmConfig;
use crate::error::{PipelineError, Result};
use crate::models::{Document, GeneratedAnswer};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct AnswerBuilder {
    /// Extracts the answer text from the reply: first capture group, or the whole match
    pattern: Option<Regex>,
    /// Matches 1-based document citations such as `[2]`
    reference_pattern: Option<Regex>,
}

impl AnswerBuilder {
    pub fn new(pattern: Option<&str>, reference_pattern: Option<&str>) -> Result<Self> {
        let compile = |name: &str, value: Option<&str>| {
            value
                .map(Regex::new)
                .transpose()
                .map_err(|e| PipelineError::Config(format!("Invalid {}: {}", name, e)))
        };

        let pattern = compile("answer_pattern", pattern)?;
        if let Some(regex) = &pattern
            && regex.captures_len() > 2
        {
            return Err(PipelineError::Config(
                "answer_pattern may contain at most one capture group".to_string(),
            ));
        }

        Ok(Self {
            pattern,
            reference_pattern: compile("reference_pattern", reference_pattern)?,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.answer_pattern.as_deref(),
            config.reference_pattern.as_deref(),
        )
    }

    pub fn run(
        &self,
        query: &str,
        replies: &[ChatMessage],
        documents: Vec<Document>,
    ) -> GeneratedAnswer {
        let reply = match replies.first() {
            Some(reply) => reply.content.as_str(),
            None => {
                warn!("No reply received for query: {}", query);
                ""
            }
        };

        let documents = match &self.reference_pattern {
            Some(pattern) => referenced_documents(pattern, reply, documents),
            None => documents,
        };

        GeneratedAnswer {
            query: query.to_string(),
            data: self.extract_answer(reply),
            documents,
            meta: BTreeMap::new(),
        }
    }

    fn extract_answer(&self, reply: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return reply.trim().to_string();
        };

        match pattern.captures(reply) {
            Some(caps) => caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            None => String::new(),
        }
    }
}

fn referenced_documents(pattern: &Regex, reply: &str, documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    let indices: Vec<usize> = pattern
        .captures_iter(reply)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .filter(|&index| index >= 1 && index <= documents.len())
        .filter(|index| seen.insert(*index))
        .collect();

    indices
        .into_iter()
        .map(|index| documents[index - 1].clone())
        .collect()
}
