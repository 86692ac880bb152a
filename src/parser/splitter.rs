// file: src/parser/splitter.rs
// description: splits cleaned documents into overlapping chunks of words, sentences, passages or pages
// reference: sliding window chunking

use crate::config::PreprocessingConfig;
use crate::error::{PipelineError, Result};
use crate::models::{Document, DocumentMeta};
use crate::parser::pdf::PAGE_BREAK;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitBy {
    Word,
    Sentence,
    Line,
    Passage,
    Page,
}

impl SplitBy {
    fn separator(&self) -> &'static str {
        match self {
            SplitBy::Word => " ",
            SplitBy::Sentence => ".",
            SplitBy::Line => "\n",
            SplitBy::Passage => "\n\n",
            SplitBy::Page => "\x0c",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentSplitter {
    split_by: SplitBy,
    split_length: usize,
    split_overlap: usize,
    split_threshold: usize,
}

impl DocumentSplitter {
    pub fn new(
        split_by: SplitBy,
        split_length: usize,
        split_overlap: usize,
        split_threshold: usize,
    ) -> Result<Self> {
        if split_length == 0 {
            return Err(PipelineError::Config(
                "split_length must be greater than 0".to_string(),
            ));
        }
        if split_overlap >= split_length {
            return Err(PipelineError::Config(format!(
                "split_overlap ({}) must be smaller than split_length ({})",
                split_overlap, split_length
            )));
        }

        Ok(Self {
            split_by,
            split_length,
            split_overlap,
            split_threshold,
        })
    }

    pub fn from_config(config: &PreprocessingConfig) -> Result<Self> {
        Self::new(
            config.split_by,
            config.split_length,
            config.split_overlap,
            config.split_threshold,
        )
    }

    pub fn split(&self, document: &Document) -> Vec<Document> {
        if document.is_empty() {
            warn!(
                "Skipping document {} from {}: no content to split",
                document.id, document.meta.source_path
            );
            return Vec::new();
        }

        let units: Vec<&str> = document
            .content
            .split_inclusive(self.split_by.separator())
            .collect();

        let mut offsets = Vec::with_capacity(units.len() + 1);
        let mut pages = Vec::with_capacity(units.len() + 1);
        let (mut chars, mut breaks) = (0usize, 0usize);
        for unit in &units {
            offsets.push(chars);
            pages.push(breaks + unit.chars().take_while(|c| *c == PAGE_BREAK).count());
            chars += unit.chars().count();
            breaks += unit.matches(PAGE_BREAK).count();
        }

        let step = self.split_length - self.split_overlap;
        let mut windows: Vec<(usize, String)> = Vec::new();
        let mut start = 0;

        while start < units.len() {
            let end = (start + self.split_length).min(units.len());
            let text = units[start..end].concat();

            let too_short = end - start < self.split_threshold;
            if too_short && let Some((_, previous)) = windows.last_mut() {
                let fresh_from = (start + self.split_overlap).min(end);
                previous.push_str(&units[fresh_from..end].concat());
            } else {
                windows.push((start, text));
            }

            if end == units.len() {
                break;
            }
            start += step;
        }

        let chunks: Vec<Document> = windows
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .enumerate()
            .map(|(split_id, (unit_start, text))| {
                Document::new(
                    text,
                    DocumentMeta {
                        source_path: document.meta.source_path.clone(),
                        source_id: Some(document.id.clone()),
                        page_number: Some(pages[unit_start] + 1),
                        split_id: Some(split_id),
                        split_idx_start: Some(offsets[unit_start]),
                    },
                )
            })
            .collect();

        debug!(
            "Split {} into {} chunks",
            document.meta.source_path,
            chunks.len()
        );
        chunks
    }

    pub fn split_all(&self, documents: &[Document]) -> Vec<Document> {
        documents.iter().flat_map(|doc| self.split(doc)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Document {
        Document::new(
            text.to_string(),
            DocumentMeta {
                source_path: "syllabus.pdf".to_string(),
                ..Default::default()
            },
        )
    }

    fn contents(chunks: &[Document]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_word_split_without_overlap() {
        let splitter = DocumentSplitter::new(SplitBy::Word, 3, 0, 0).unwrap();
        let chunks = splitter.split(&doc("one two three four five"));

        assert_eq!(contents(&chunks), vec!["one two three ", "four five"]);
        assert_eq!(chunks[1].meta.split_id, Some(1));
        assert_eq!(chunks[1].meta.split_idx_start, Some(14));
    }

    #[test]
    fn test_word_split_with_overlap() {
        let splitter = DocumentSplitter::new(SplitBy::Word, 3, 1, 0).unwrap();
        let chunks = splitter.split(&doc("a b c d e"));

        assert_eq!(contents(&chunks), vec!["a b c ", "c d e"]);
    }

    #[test]
    fn test_threshold_merges_short_tail() {
        let splitter = DocumentSplitter::new(SplitBy::Word, 3, 0, 2).unwrap();
        let chunks = splitter.split(&doc("a b c d"));

        assert_eq!(contents(&chunks), vec!["a b c d"]);
    }

    #[test]
    fn test_page_numbers_follow_page_breaks() {
        let splitter = DocumentSplitter::new(SplitBy::Word, 2, 0, 0).unwrap();
        let chunks = splitter.split(&doc("p1 text \x0cp2 text"));

        assert_eq!(chunks[0].meta.page_number, Some(1));
        assert_eq!(chunks[1].meta.page_number, Some(2));
    }

    #[test]
    fn test_chunks_reference_source() {
        let source = doc("alpha beta");
        let splitter = DocumentSplitter::new(SplitBy::Word, 200, 0, 0).unwrap();
        let chunks = splitter.split(&source);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].meta.source_id.as_deref(), Some(source.id.as_str()));
        assert_eq!(chunks[0].meta.source_path, "syllabus.pdf");
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let splitter = DocumentSplitter::new(SplitBy::Word, 200, 0, 0).unwrap();
        assert!(splitter.split(&doc("   ")).is_empty());
    }

    #[test]
    fn test_invalid_overlap() {
        assert!(DocumentSplitter::new(SplitBy::Word, 5, 5, 0).is_err());
        assert!(DocumentSplitter::new(SplitBy::Word, 0, 0, 0).is_err());
    }

    #[test]
    fn test_split_is_deterministic() {
        let splitter = DocumentSplitter::new(SplitBy::Sentence, 1, 0, 0).unwrap();
        let first = splitter.split(&doc("One. Two. Three."));
        let second = splitter.split(&doc("One. Two. Three."));

        assert_eq!(first.len(), 3);
        assert_eq!(
            first.iter().map(|d| &d.id).collect::<Vec<_>>(),
            second.iter().map(|d| &d.id).collect::<Vec<_>>()
        );
    }
}
