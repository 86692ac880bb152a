// file: src/retrieval/joiner.rs
// description: merges candidate lists from several retrievers into one ranked list
// reference: Cormack et al., "Reciprocal Rank Fusion outperforms Condorcet and individual Rank Learning Methods"

use crate::error::{PipelineError, Result};
use crate::models::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const RRF_K: f32 = 61.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Union of all lists, duplicates keep their highest score
    #[default]
    Concatenate,
    ReciprocalRankFusion,
    /// Weighted sum of the scores each list assigned
    Merge,
}

#[derive(Debug, Clone)]
pub struct DocumentJoiner {
    mode: JoinMode,
    weights: Option<Vec<f32>>,
    top_k: Option<usize>,
}

impl DocumentJoiner {
    pub fn new(mode: JoinMode) -> Self {
        Self {
            mode,
            weights: None,
            top_k: None,
        }
    }

    pub fn with_weights(mut self, weights: Vec<f32>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn run(&self, lists: Vec<Vec<Document>>) -> Result<Vec<Document>> {
        let weights = self.weights_for(lists.len())?;

        let mut joined = match self.mode {
            JoinMode::Concatenate => concatenate(lists),
            JoinMode::ReciprocalRankFusion => fuse(lists, &weights, |rank, _| {
                1.0 / (RRF_K + rank as f32)
            }),
            JoinMode::Merge => fuse(lists, &weights, |_, doc| doc.score.unwrap_or(0.0)),
        };

        joined.sort_by(|a, b| {
            let a = a.score.unwrap_or(f32::NEG_INFINITY);
            let b = b.score.unwrap_or(f32::NEG_INFINITY);
            b.total_cmp(&a)
        });

        if let Some(top_k) = self.top_k {
            joined.truncate(top_k);
        }
        Ok(joined)
    }

    fn weights_for(&self, lists: usize) -> Result<Vec<f32>> {
        match &self.weights {
            Some(weights) if weights.len() != lists => Err(PipelineError::Validation(format!(
                "Joiner has {} weights for {} document lists",
                weights.len(),
                lists
            ))),
            Some(weights) => Ok(weights.clone()),
            None if lists == 0 => Ok(Vec::new()),
            None => Ok(vec![1.0 / lists as f32; lists]),
        }
    }
}

impl Default for DocumentJoiner {
    fn default() -> Self {
        Self::new(JoinMode::Concatenate)
    }
}

fn concatenate(lists: Vec<Vec<Document>>) -> Vec<Document> {
    let mut joined: Vec<Document> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for doc in lists.into_iter().flatten() {
        match positions.get(&doc.id) {
            Some(&pos) => {
                let existing = joined[pos].score.unwrap_or(f32::NEG_INFINITY);
                if doc.score.unwrap_or(f32::NEG_INFINITY) > existing {
                    joined[pos] = doc;
                }
            }
            None => {
                positions.insert(doc.id.clone(), joined.len());
                joined.push(doc);
            }
        }
    }

    joined
}

fn fuse(
    lists: Vec<Vec<Document>>,
    weights: &[f32],
    contribution: impl Fn(usize, &Document) -> f32,
) -> Vec<Document> {
    let mut joined: Vec<Document> = Vec::new();
    let mut scores: Vec<f32> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (list, weight) in lists.into_iter().zip(weights) {
        for (rank, doc) in list.into_iter().enumerate() {
            let value = weight * contribution(rank, &doc);
            match positions.get(&doc.id) {
                Some(&pos) => scores[pos] += value,
                None => {
                    positions.insert(doc.id.clone(), joined.len());
                    joined.push(doc);
                    scores.push(value);
                }
            }
        }
    }

    joined
        .into_iter()
        .zip(scores)
        .map(|(doc, score)| doc.with_score(score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMeta;

    fn doc(text: &str, score: f32) -> Document {
        Document::new(text.to_string(), DocumentMeta::default()).with_score(score)
    }

    fn contents(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.content.as_str()).collect()
    }

    #[test]
    fn test_concatenate_dedupes_keeping_highest_score() {
        let joiner = DocumentJoiner::default();
        let joined = joiner
            .run(vec![
                vec![doc("a", 0.9), doc("b", 0.2)],
                vec![doc("b", 5.0), doc("c", 1.0)],
            ])
            .unwrap();

        assert_eq!(contents(&joined), vec!["b", "c", "a"]);
        assert_eq!(joined[0].score, Some(5.0));
    }

    #[test]
    fn test_rrf_rewards_agreement() {
        let joiner = DocumentJoiner::new(JoinMode::ReciprocalRankFusion);
        let joined = joiner
            .run(vec![
                vec![doc("a", 0.9), doc("shared", 0.8)],
                vec![doc("b", 12.0), doc("shared", 10.0)],
            ])
            .unwrap();

        assert_eq!(joined[0].content, "shared");
        assert_eq!(joined.len(), 3);
    }

    #[test]
    fn test_merge_uses_weights() {
        let joiner = DocumentJoiner::new(JoinMode::Merge).with_weights(vec![1.0, 0.0]);
        let joined = joiner
            .run(vec![vec![doc("a", 0.3)], vec![doc("b", 100.0)]])
            .unwrap();

        assert_eq!(contents(&joined), vec!["a", "b"]);
        assert_eq!(joined[1].score, Some(0.0));
    }

    #[test]
    fn test_weight_count_mismatch() {
        let joiner = DocumentJoiner::new(JoinMode::Merge).with_weights(vec![1.0]);
        assert!(joiner.run(vec![vec![], vec![]]).is_err());
    }

    #[test]
    fn test_top_k_truncates() {
        let joiner = DocumentJoiner::default().with_top_k(Some(1));
        let joined = joiner
            .run(vec![vec![doc("a", 0.1), doc("b", 0.2)]])
            .unwrap();

        assert_eq!(contents(&joined), vec!["b"]);
    }
}
