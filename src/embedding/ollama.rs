// file: src/embedding/ollama.rs
// description: Ollama API integration for batched text embeddings
// reference: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-embeddings

use super::TextEmbedder;
use crate::config::EmbedderConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    options: EmbedOptions,
}

#[derive(Debug, Serialize)]
struct EmbedOptions {
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct OllamaEmbedder {
    client: Client,
    config: EmbedderConfig,
}

impl OllamaEmbedder {
    pub fn new(config: EmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextEmbedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.config.base_url.trim_end_matches('/'));
        let request = EmbedRequest {
            model: &self.config.model,
            input: texts,
            // Ollama falls back to a small context window unless one is given
            options: EmbedOptions {
                num_ctx: self.config.num_ctx,
            },
        };

        debug!(
            "Requesting {} embeddings from Ollama model {}",
            texts.len(),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Embedding(format!("Failed to send Ollama embed request: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Embedding(format!(
                "Ollama embed request failed with status {}: {}",
                status, error_text
            )));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            PipelineError::Embedding(format!("Failed to parse Ollama embed response: {}", e))
        })?;

        if embed_response.embeddings.len() != texts.len() {
            return Err(PipelineError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                embed_response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(embed_response.embeddings)
    }
}
