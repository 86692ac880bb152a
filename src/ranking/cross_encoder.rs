// file: src/ranking/cross_encoder.rs
// description: cross-encoder re-ranking through a text-embeddings-inference compatible /rerank endpoint
// reference: https://huggingface.github.io/text-embeddings-inference/#/Text%20Embeddings%20Inference/rerank

use super::{Ranker, select_top};
use crate::config::RankerConfig;
use crate::error::{PipelineError, Result};
use crate::models::Document;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: Vec<&'a str>,
    raw_scores: bool,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct RerankScore {
    index: usize,
    score: f32,
}

pub struct CrossEncoderRanker {
    client: Client,
    config: RankerConfig,
}

impl CrossEncoderRanker {
    pub fn new(config: RankerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Ranker for CrossEncoderRanker {
    async fn rank(
        &self,
        query: &str,
        documents: Vec<Document>,
        top_k: usize,
    ) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Ok(documents);
        }

        let url = format!("{}/rerank", self.config.base_url.trim_end_matches('/'));
        let request = RerankRequest {
            query,
            texts: documents.iter().map(|doc| doc.content.as_str()).collect(),
            // the service applies the sigmoid itself unless raw scores are requested
            raw_scores: !self.config.scale_score,
            truncate: true,
        };

        debug!(
            "Re-ranking {} documents with {}",
            documents.len(),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Ranking(format!("Failed to send rerank request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Ranking(format!(
                "Rerank request failed with status {}: {}",
                status, error_text
            )));
        }

        let ranked: Vec<RerankScore> = response.json().await.map_err(|e| {
            PipelineError::Ranking(format!("Failed to parse rerank response: {}", e))
        })?;

        let mut scores = vec![f32::NEG_INFINITY; documents.len()];
        for entry in ranked {
            let slot = scores.get_mut(entry.index).ok_or_else(|| {
                PipelineError::Ranking(format!(
                    "Rerank response references unknown document index {}",
                    entry.index
                ))
            })?;
            *slot = entry.score;
        }

        Ok(select_top(
            documents,
            scores,
            top_k,
            self.config.score_threshold,
        ))
    }
}
