// file: src/generation/ollama.rs
// description: chat completion capability and its Ollama backend
// reference: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion

use super::message::ChatMessage;
use crate::config::LlmConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[async_trait]
pub trait ChatGenerator: Send + Sync {
    fn model(&self) -> &str;

    /// Returns the model replies for the conversation, first reply first.
    async fn run(&self, messages: &[ChatMessage]) -> Result<Vec<ChatMessage>>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    #[serde(default)]
    eval_count: Option<u64>,
}

pub struct OllamaChatGenerator {
    client: Client,
    config: LlmConfig,
}

impl OllamaChatGenerator {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Chat generator using Ollama model {}", config.model);
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatGenerator for OllamaChatGenerator {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn run(&self, messages: &[ChatMessage]) -> Result<Vec<ChatMessage>> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            stream: false,
            options: ChatOptions {
                seed: self.config.seed,
                num_ctx: self.config.num_ctx,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Llm(format!("Failed to send chat request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Llm(format!(
                "Chat request failed with status {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Llm(format!("Failed to parse chat response: {}", e)))?;

        debug!(
            "Received {} chars from {} ({} tokens)",
            chat_response.message.content.len(),
            self.config.model,
            chat_response.eval_count.unwrap_or_default()
        );

        Ok(vec![chat_response.message])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::message::ChatRole;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_chat_request_carries_seed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "qwen2.5:latest",
                "stream": false,
                "options": {"seed": 42},
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "qwen2.5:latest",
                "message": {"role": "assistant", "content": "Hi there"},
                "done": true,
                "eval_count": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = OllamaChatGenerator::new(config(&server.uri())).unwrap();
        let replies = generator
            .run(&[ChatMessage::from_user("hello")])
            .await
            .unwrap();

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].role, ChatRole::Assistant);
        assert_eq!(replies[0].content, "Hi there");
    }

    #[tokio::test]
    async fn test_chat_failure_is_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("out of memory"))
            .mount(&server)
            .await;

        let generator = OllamaChatGenerator::new(config(&server.uri())).unwrap();
        let err = generator
            .run(&[ChatMessage::from_user("hello")])
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Llm(_)));
        assert!(!err.is_recoverable());
    }
}
