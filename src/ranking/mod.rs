// file: src/ranking/mod.rs
// description: re-ranking capability and its backends
// reference: internal module structure

pub mod cross_encoder;
pub mod similarity;

pub use cross_encoder::CrossEncoderRanker;
pub use similarity::EmbeddingSimilarityRanker;

use crate::error::Result;
use crate::models::Document;
use async_trait::async_trait;

#[async_trait]
pub trait Ranker: Send + Sync {
    /// Reorders `documents` by relevance to `query`, keeping at most `top_k`.
    async fn rank(&self, query: &str, documents: Vec<Document>, top_k: usize)
    -> Result<Vec<Document>>;

    /// Same as [`Ranker::rank`], reusing a query embedding the caller already holds.
    /// Backends that score text pairs ignore it.
    async fn rank_embedded(
        &self,
        query: &str,
        _query_embedding: &[f32],
        documents: Vec<Document>,
        top_k: usize,
    ) -> Result<Vec<Document>> {
        self.rank(query, documents, top_k).await
    }
}

/// Attaches scores, drops anything under the threshold, sorts descending and truncates.
/// Ties keep their incoming order.
pub(crate) fn select_top(
    documents: Vec<Document>,
    scores: Vec<f32>,
    top_k: usize,
    score_threshold: Option<f32>,
) -> Vec<Document> {
    let mut ranked: Vec<Document> = documents
        .into_iter()
        .zip(scores)
        .filter(|(_, score)| score_threshold.is_none_or(|threshold| *score >= threshold))
        .map(|(doc, score)| doc.with_score(score))
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .unwrap_or_default()
            .total_cmp(&a.score.unwrap_or_default())
    });
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMeta;

    #[test]
    fn test_select_top_sorts_and_filters() {
        let docs: Vec<Document> = ["a", "b", "c", "d"]
            .iter()
            .map(|t| Document::new(t.to_string(), DocumentMeta::default()))
            .collect();

        let ranked = select_top(docs, vec![0.2, 0.9, 0.05, 0.9], 2, Some(0.1));

        let contents: Vec<_> = ranked.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "d"]);
    }
}
