// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod answer;
pub mod document;
pub mod evaluation;
pub mod query;

pub use answer::{AnswerRecord, GeneratedAnswer};
pub use document::{Document, DocumentMeta};
pub use evaluation::{EvaluationReport, EvaluationResult};
pub use query::QueryRecord;
