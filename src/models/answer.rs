// file: src/models/answer.rs
// description: generated answer with its supporting documents
// reference: answer builder output

use crate::models::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub query: String,
    /// Answer text produced by the chat model
    pub data: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl GeneratedAnswer {
    /// Supporting document contents joined into a single context passage.
    pub fn context(&self) -> String {
        self.documents
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One line of the generated answers file: the reference answer next to the generated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    #[serde(rename = "answer")]
    pub reference_answer: String,
    pub generated_answer: GeneratedAnswer,
}
