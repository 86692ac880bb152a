// file: src/models/evaluation.rs
// description: faithfulness judgments and the aggregated evaluation report

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub query: String,
    pub predicted_answer: String,
    /// Fraction of answer statements supported by the context
    pub score: f64,
    pub statements: Vec<String>,
    pub statement_scores: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub run_id: String,
    pub exported_at: String,
    pub evaluated: usize,
    pub skipped: usize,
    pub mean_score: Option<f64>,
    pub results: Vec<EvaluationResult>,
}

impl EvaluationReport {
    pub fn mean_score(results: &[EvaluationResult]) -> Option<f64> {
        if results.is_empty() {
            return None;
        }
        Some(results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64)
    }
}
