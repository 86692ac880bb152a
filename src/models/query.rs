// file: src/models/query.rs
// description: input question records with optional reference answers
// reference: documents/input/input.json format

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    #[serde(default)]
    pub question: String,
    /// Reference answer, empty when the input file carries none
    #[serde(default)]
    pub answer: String,
}

impl QueryRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn reference_answer(&self) -> Option<&str> {
        if self.answer.trim().is_empty() {
            None
        } else {
            Some(&self.answer)
        }
    }
}
