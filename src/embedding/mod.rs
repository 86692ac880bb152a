// file: src/embedding/mod.rs
// description: text embedding capability and its backends
// reference: internal module structure

pub mod hashing;
pub mod ollama;

pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;

use crate::error::{PipelineError, Result};
use crate::models::Document;
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait TextEmbedder: Send + Sync {
    fn model(&self) -> &str;

    fn batch_size(&self) -> usize {
        32
    }

    /// Returns one vector per input text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_documents(&self, mut documents: Vec<Document>) -> Result<Vec<Document>> {
        let batch_size = self.batch_size().max(1);

        for (batch_index, batch) in documents.chunks_mut(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|doc| doc.content.clone()).collect();
            let embeddings = self.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(PipelineError::Embedding(format!(
                    "Expected {} embeddings, received {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            for (doc, embedding) in batch.iter_mut().zip(embeddings) {
                doc.embedding = Some(embedding);
            }
            debug!("Embedded batch {} ({} documents)", batch_index + 1, batch.len());
        }

        Ok(documents)
    }
}

/// Cosine similarity; zero when either vector has no magnitude or dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot = dot_product(a, b);
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
