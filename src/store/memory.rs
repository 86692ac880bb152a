// file: src/store/memory.rs
// description: process-lifetime document store with vector and BM25 search
// reference: in-memory replacement for a persistent vector table

use crate::config::StoreConfig;
use crate::embedding::{cosine_similarity, dot_product};
use crate::error::{PipelineError, Result};
use crate::models::Document;
use crate::retrieval::bm25::{Bm25Index, Bm25Parameters};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Abort the write when an id already exists
    #[default]
    Fail,
    Skip,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFunction {
    #[default]
    DotProduct,
    Cosine,
}

impl SimilarityFunction {
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SimilarityFunction::DotProduct => dot_product(a, b),
            SimilarityFunction::Cosine => cosine_similarity(a, b),
        }
    }

    /// Maps a raw similarity into `[0, 1]`.
    pub fn scale(&self, score: f32) -> f32 {
        match self {
            SimilarityFunction::DotProduct => 1.0 / (1.0 + (-score / 100.0).exp()),
            SimilarityFunction::Cosine => (score + 1.0) / 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    documents: Vec<Document>,
    positions: HashMap<String, usize>,
    bm25: Bm25Index,
    bm25_params: Bm25Parameters,
    similarity: SimilarityFunction,
}

impl InMemoryDocumentStore {
    pub fn new(similarity: SimilarityFunction) -> Self {
        Self {
            documents: Vec::new(),
            positions: HashMap::new(),
            bm25: Bm25Index::default(),
            bm25_params: Bm25Parameters::default(),
            similarity,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.similarity).with_bm25_parameters(Bm25Parameters {
            k1: config.bm25_k1,
            b: config.bm25_b,
            epsilon: config.bm25_epsilon,
        })
    }

    pub fn with_bm25_parameters(mut self, params: Bm25Parameters) -> Self {
        self.bm25_params = params;
        self.rebuild_bm25();
        self
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.positions.get(id).map(|&pos| &self.documents[pos])
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn similarity(&self) -> SimilarityFunction {
        self.similarity
    }

    /// Returns the number of documents written.
    pub fn write_documents(
        &mut self,
        documents: Vec<Document>,
        policy: DuplicatePolicy,
    ) -> Result<usize> {
        let mut written = 0;
        let mut overwritten = false;

        for document in documents {
            match (self.positions.get(&document.id).copied(), policy) {
                (None, _) => {
                    self.positions
                        .insert(document.id.clone(), self.documents.len());
                    self.bm25.add(&document.content);
                    self.documents.push(document);
                    written += 1;
                }
                (Some(_), DuplicatePolicy::Fail) => {
                    return Err(PipelineError::Store(format!(
                        "Document with id {} already exists",
                        document.id
                    )));
                }
                (Some(_), DuplicatePolicy::Skip) => {
                    warn!("Skipping duplicate document {}", document.id);
                }
                (Some(pos), DuplicatePolicy::Overwrite) => {
                    debug!("Overwriting document {}", document.id);
                    self.documents[pos] = document;
                    overwritten = true;
                    written += 1;
                }
            }
        }

        if overwritten {
            self.rebuild_bm25();
        }

        info!(
            "Wrote {} documents ({} total in store)",
            written,
            self.documents.len()
        );
        Ok(written)
    }

    fn rebuild_bm25(&mut self) {
        self.bm25 = Bm25Index::build(
            self.bm25_params,
            self.documents.iter().map(|d| d.content.as_str()),
        );
    }

    /// Top documents by embedding similarity, highest first. Documents without
    /// embeddings never match.
    pub fn embedding_retrieval(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        scale_score: bool,
    ) -> Result<Vec<Document>> {
        if query_embedding.is_empty() {
            return Err(PipelineError::Validation(
                "Query embedding must not be empty".to_string(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = Vec::new();
        for (pos, document) in self.documents.iter().enumerate() {
            let Some(embedding) = document.embedding.as_deref() else {
                continue;
            };
            if embedding.len() != query_embedding.len() {
                return Err(PipelineError::Store(format!(
                    "Embedding dimension mismatch: query has {}, document {} has {}",
                    query_embedding.len(),
                    document.id,
                    embedding.len()
                )));
            }
            let mut score = self.similarity.score(query_embedding, embedding);
            if scale_score {
                score = self.similarity.scale(score);
            }
            scored.push((pos, score));
        }

        Ok(self.take_top(scored, top_k))
    }

    /// Top documents by BM25 score, highest first. Documents sharing no term
    /// with the query are excluded.
    pub fn bm25_retrieval(&self, query: &str, top_k: usize, scale_score: bool) -> Vec<Document> {
        let scored: Vec<(usize, f32)> = self
            .bm25
            .scores(query)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .map(|(pos, score)| {
                if scale_score {
                    (pos, 1.0 / (1.0 + (-score / 8.0).exp()))
                } else {
                    (pos, score)
                }
            })
            .collect();

        self.take_top(scored, top_k)
    }

    fn take_top(&self, mut scored: Vec<(usize, f32)>, top_k: usize) -> Vec<Document> {
        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(top_k)
            .map(|(pos, score)| self.documents[pos].clone().with_score(score))
            .collect()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(SimilarityFunction::default())
    }
}
