// file: src/parser/pdf.rs
// description: PDF to document conversion
// reference: https://docs.rs/pdf-extract

use crate::error::{PipelineError, Result};
use crate::models::{Document, DocumentMeta};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Page separator inserted between extracted pages.
pub const PAGE_BREAK: char = '\x0c';

pub struct PdfConverter;

impl PdfConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, path: &Path) -> Result<Document> {
        let data = fs::read(path).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

        let content = self.convert_bytes(path, &data)?;

        if content.trim().is_empty() {
            warn!(
                "No text could be extracted from {}; the PDF may be scanned images",
                path.display()
            );
        }

        Ok(Document::new(
            content,
            DocumentMeta {
                source_path: path.display().to_string(),
                ..Default::default()
            },
        ))
    }

    pub fn convert_all(&self, paths: &[impl AsRef<Path>]) -> Result<Vec<Document>> {
        paths.iter().map(|path| self.convert(path.as_ref())).collect()
    }

    fn convert_bytes(&self, path: &Path, data: &[u8]) -> Result<String> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(data).map_err(|e| {
            PipelineError::PdfExtraction {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        let text = join_pages(&pages);
        debug!(
            "Extracted {} chars ({} pages) from {}",
            text.len(),
            pages.len(),
            path.display()
        );

        Ok(text)
    }
}

/// Joins per-page text with [`PAGE_BREAK`] so page boundaries survive cleaning and splitting.
pub fn join_pages(pages: &[String]) -> String {
    pages.join(&PAGE_BREAK.to_string())
}

impl Default for PdfConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DocumentCleaner, DocumentSplitter, SplitBy};
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};
    use tempfile::TempDir;

    /// Writes a PDF with one line of Courier text per page.
    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_pages_are_separated_by_page_break() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("syllabus.pdf");
        write_pdf(&path, &["Alpha page one", "Bravo page two"]);

        let document = PdfConverter::new().convert(&path).unwrap();
        assert_eq!(document.content.matches(PAGE_BREAK).count(), 1);
        assert!(!document.content.contains("oneBravo"));

        let cleaned = DocumentCleaner::new().clean(&document);
        let chunks = DocumentSplitter::new(SplitBy::Page, 1, 0, 0)
            .unwrap()
            .split(&cleaned);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.contains("Alpha"));
        assert_eq!(chunks[0].meta.page_number, Some(1));
        assert!(chunks[1].content.contains("Bravo"));
        assert_eq!(chunks[1].meta.page_number, Some(2));
    }

    #[test]
    fn test_join_pages() {
        let pages = vec!["first".to_string(), "second".to_string()];
        assert_eq!(join_pages(&pages), "first\x0csecond");
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let converter = PdfConverter::new();
        let err = converter
            .convert(Path::new("/nonexistent/handbook.pdf"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileOperation { .. }));
    }

    #[test]
    fn test_invalid_pdf_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();

        let err = PdfConverter::new().convert(&path).unwrap_err();
        assert!(matches!(err, PipelineError::PdfExtraction { .. }));
    }
}
