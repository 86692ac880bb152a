// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("PDF extraction failed for {path}: {message}")]
    PdfExtraction { path: PathBuf, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Ranking error: {0}")]
    Ranking(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// Judge call failure for a single item
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    /// Per-item judgement failures are skippable; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_) | PipelineError::Evaluation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_item_failures_are_recoverable() {
        assert!(PipelineError::Validation("bad score".to_string()).is_recoverable());
        assert!(PipelineError::Evaluation("status 502".to_string()).is_recoverable());
        assert!(!PipelineError::Llm("connection refused".to_string()).is_recoverable());
        assert!(!PipelineError::Config("missing".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::PdfExtraction {
            path: PathBuf::from("docs/test.pdf"),
            message: "invalid xref".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "PDF extraction failed for docs/test.pdf: invalid xref"
        );
    }
}
