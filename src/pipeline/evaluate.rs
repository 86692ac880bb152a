// file: src/pipeline/evaluate.rs
// description: faithfulness scoring over previously generated answers

use crate::error::Result;
use crate::evaluation::FaithfulnessScorer;
use crate::exporter::GeneratedAnswerSet;
use crate::models::EvaluationResult;
use crate::pipeline::progress::ProgressTracker;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    pub results: Vec<EvaluationResult>,
    pub skipped: usize,
}

pub struct EvaluationPipeline {
    scorer: Arc<dyn FaithfulnessScorer>,
    show_progress: bool,
}

impl EvaluationPipeline {
    pub fn new(scorer: Arc<dyn FaithfulnessScorer>) -> Self {
        Self {
            scorer,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Items whose judge call fails or whose judgement fails validation are
    /// logged and skipped; any other error aborts the run.
    pub async fn run(&self, answers: &GeneratedAnswerSet) -> Result<EvaluationOutcome> {
        let progress = if self.show_progress {
            ProgressTracker::new(answers.len())
        } else {
            ProgressTracker::hidden(answers.len())
        };

        let mut outcome = EvaluationOutcome::default();
        let items = answers
            .queries
            .iter()
            .zip(&answers.contexts)
            .zip(&answers.answers);

        for ((query, contexts), answer) in items {
            match self.scorer.score(query, contexts, answer).await {
                Ok(result) => {
                    debug!("Faithfulness {:.2} for: {}", result.score, query);
                    outcome.results.push(result);
                    progress.inc_completed();
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping due to error: {}", e);
                    outcome.skipped += 1;
                    progress.inc_skipped();
                }
                Err(e) => return Err(e),
            }
        }

        progress.finish();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use async_trait::async_trait;

    /// Fails with the given error whenever the answer equals `trigger`.
    struct ScriptedScorer {
        trigger: &'static str,
        error: fn() -> PipelineError,
    }

    #[async_trait]
    impl FaithfulnessScorer for ScriptedScorer {
        async fn score(
            &self,
            question: &str,
            contexts: &[String],
            predicted_answer: &str,
        ) -> Result<EvaluationResult> {
            if predicted_answer == self.trigger {
                return Err((self.error)());
            }
            Ok(EvaluationResult {
                query: question.to_string(),
                predicted_answer: predicted_answer.to_string(),
                score: if contexts.is_empty() { 0.0 } else { 1.0 },
                statements: vec![predicted_answer.to_string()],
                statement_scores: vec![u8::from(!contexts.is_empty())],
            })
        }
    }

    fn answers() -> GeneratedAnswerSet {
        GeneratedAnswerSet {
            queries: vec!["q1".into(), "q2".into(), "q3".into()],
            contexts: vec![vec!["c1".into()], vec!["c2".into()], vec![]],
            answers: vec!["a1".into(), "bad".into(), "a3".into()],
            references: vec![String::new(); 3],
        }
    }

    fn pipeline(error: fn() -> PipelineError) -> EvaluationPipeline {
        EvaluationPipeline::new(Arc::new(ScriptedScorer {
            trigger: "bad",
            error,
        }))
        .with_progress(false)
    }

    #[tokio::test]
    async fn test_validation_error_skips_only_that_item() {
        let outcome = pipeline(|| PipelineError::Validation("statement_scores missing".into()))
            .run(&answers())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.results[0].query, "q1");
        assert_eq!(outcome.results[1].query, "q3");
        assert_eq!(outcome.results[1].score, 0.0);
    }

    #[tokio::test]
    async fn test_judge_call_failure_skips_only_that_item() {
        let outcome = pipeline(|| PipelineError::Evaluation("status 503".into()))
            .run(&answers())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_other_errors_abort() {
        let err = pipeline(|| PipelineError::Config("missing api key".into()))
            .run(&answers())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_outcome() {
        let outcome = pipeline(|| PipelineError::Validation(String::new()))
            .run(&GeneratedAnswerSet::default())
            .await
            .unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.skipped, 0);
    }
}
