// file: src/retrieval/retrievers.rs
// description: embedding and BM25 retrievers reading from the in-memory store
// reference: hybrid dense + lexical candidate generation

use crate::error::Result;
use crate::models::Document;
use crate::store::InMemoryDocumentStore;
use std::sync::Arc;
use tracing::debug;

pub struct EmbeddingRetriever {
    store: Arc<InMemoryDocumentStore>,
    top_k: usize,
    scale_score: bool,
}

impl EmbeddingRetriever {
    pub fn new(store: Arc<InMemoryDocumentStore>, top_k: usize) -> Self {
        Self {
            store,
            top_k,
            scale_score: false,
        }
    }

    pub fn with_scale_score(mut self, scale_score: bool) -> Self {
        self.scale_score = scale_score;
        self
    }

    pub fn run(&self, query_embedding: &[f32]) -> Result<Vec<Document>> {
        let documents =
            self.store
                .embedding_retrieval(query_embedding, self.top_k, self.scale_score)?;
        debug!("Embedding retriever returned {} documents", documents.len());
        Ok(documents)
    }
}

pub struct Bm25Retriever {
    store: Arc<InMemoryDocumentStore>,
    top_k: usize,
    scale_score: bool,
}

impl Bm25Retriever {
    pub fn new(store: Arc<InMemoryDocumentStore>, top_k: usize) -> Self {
        Self {
            store,
            top_k,
            scale_score: false,
        }
    }

    pub fn with_scale_score(mut self, scale_score: bool) -> Self {
        self.scale_score = scale_score;
        self
    }

    pub fn run(&self, query: &str) -> Vec<Document> {
        let documents = self
            .store
            .bm25_retrieval(query, self.top_k, self.scale_score);
        debug!("BM25 retriever returned {} documents", documents.len());
        documents
    }
}
