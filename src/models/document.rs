// file: src/models/document.rs
// description: core document model with content-derived identifiers
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Path of the PDF the text was extracted from
    pub source_path: String,
    /// Identifier of the unsplit document this chunk came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_idx_start: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default)]
    pub meta: DocumentMeta,
}

impl Document {
    pub fn new(content: String, meta: DocumentMeta) -> Self {
        let id = Self::compute_id(&content, &meta);
        Self {
            id,
            content,
            embedding: None,
            score: None,
            meta,
        }
    }

    /// Identifiers depend only on content and provenance, so indexing the same
    /// sources twice produces the same ids.
    fn compute_id(content: &str, meta: &DocumentMeta) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hasher.update(meta.source_path.as_bytes());
        if let Some(split_id) = meta.split_id {
            hasher.update(split_id.to_le_bytes());
        }
        if let Some(page) = meta.page_number {
            hasher.update(page.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Rebuild the id after content or meta changed during preprocessing.
    pub fn refresh_id(&mut self) {
        self.id = Self::compute_id(&self.content, &self.meta);
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(split_id: usize) -> DocumentMeta {
        DocumentMeta {
            source_path: "docs/syllabus.pdf".to_string(),
            split_id: Some(split_id),
            ..Default::default()
        }
    }

    #[test]
    fn test_document_creation() {
        let doc = Document::new("Regrade requests close after 5 days.".to_string(), meta(0));

        assert_eq!(doc.id.len(), 64);
        assert!(doc.embedding.is_none());
        assert!(doc.score.is_none());
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_id_consistency() {
        let a = Document::new("Same text".to_string(), meta(1));
        let b = Document::new("Same text".to_string(), meta(1));
        let c = Document::new("Same text".to_string(), meta(2));
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }
}
