// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn has_pdf_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    }

    pub fn validate_pdf_extension(path: &Path) -> Result<()> {
        if Self::has_pdf_extension(path) {
            Ok(())
        } else {
            Err(PipelineError::Validation(format!(
                "File is not a PDF: {}",
                path.display()
            )))
        }
    }

    pub fn validate_content_not_empty(field: &str, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(PipelineError::Validation(format!("{} is empty", field)));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Shortens to `max_chars` characters, appending an ellipsis when cut.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let head: String = text.chars().take(max_chars).collect();
            format!("{}...", head)
        }
    }
}
