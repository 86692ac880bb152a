// file: src/ranking/similarity.rs
// description: re-ranks candidates by embedding similarity to the query
// reference: bi-encoder semantic re-ranking

use super::{Ranker, select_top};
use crate::embedding::{TextEmbedder, cosine_similarity};
use crate::error::Result;
use crate::models::Document;
use crate::store::SimilarityFunction;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct EmbeddingSimilarityRanker {
    embedder: Arc<dyn TextEmbedder>,
    scale_score: bool,
    score_threshold: Option<f32>,
}

impl EmbeddingSimilarityRanker {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            scale_score: true,
            score_threshold: None,
        }
    }

    pub fn with_scale_score(mut self, scale_score: bool) -> Self {
        self.scale_score = scale_score;
        self
    }

    pub fn with_score_threshold(mut self, score_threshold: Option<f32>) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    /// Reuses stored embeddings and only embeds documents that lack one.
    async fn document_embeddings(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>> {
        let missing: Vec<String> = documents
            .iter()
            .filter(|doc| doc.embedding.is_none())
            .map(|doc| doc.content.clone())
            .collect();

        let mut fresh = if missing.is_empty() {
            Vec::new().into_iter()
        } else {
            debug!("Embedding {} documents for ranking", missing.len());
            self.embedder.embed_batch(&missing).await?.into_iter()
        };

        Ok(documents
            .iter()
            .map(|doc| match &doc.embedding {
                Some(embedding) => embedding.clone(),
                None => fresh.next().unwrap_or_default(),
            })
            .collect())
    }

    async fn score_documents(
        &self,
        query_embedding: &[f32],
        documents: Vec<Document>,
        top_k: usize,
    ) -> Result<Vec<Document>> {
        let embeddings = self.document_embeddings(&documents).await?;

        let scores: Vec<f32> = embeddings
            .iter()
            .map(|embedding| {
                let score = cosine_similarity(query_embedding, embedding);
                if self.scale_score {
                    SimilarityFunction::Cosine.scale(score)
                } else {
                    score
                }
            })
            .collect();

        Ok(select_top(documents, scores, top_k, self.score_threshold))
    }
}

#[async_trait]
impl Ranker for EmbeddingSimilarityRanker {
    async fn rank(
        &self,
        query: &str,
        documents: Vec<Document>,
        top_k: usize,
    ) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Ok(documents);
        }

        let query_embedding = self.embedder.embed(query).await?;
        self.score_documents(&query_embedding, documents, top_k).await
    }

    async fn rank_embedded(
        &self,
        _query: &str,
        query_embedding: &[f32],
        documents: Vec<Document>,
        top_k: usize,
    ) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Ok(documents);
        }
        self.score_documents(query_embedding, documents, top_k).await
    }
}
