// file: src/evaluation/mod.rs
// description: faithfulness scoring capability and its LLM-judge backend
// reference: internal module structure

pub mod faithfulness;

pub use faithfulness::FaithfulnessEvaluator;

use crate::error::Result;
use crate::models::EvaluationResult;
use async_trait::async_trait;

#[async_trait]
pub trait FaithfulnessScorer: Send + Sync {
    /// Judges whether `predicted_answer` is supported by `contexts`.
    ///
    /// Malformed inputs or judge output surface as `PipelineError::Validation`,
    /// which callers may treat as a per-item skip.
    async fn score(
        &self,
        question: &str,
        contexts: &[String],
        predicted_answer: &str,
    ) -> Result<EvaluationResult>;
}
