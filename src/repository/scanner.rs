// file: src/repository/scanner.rs
// description: Resolves configured source entries into an ordered list of PDF files
// reference: https://docs.rs/walkdir

use crate::config::SourcesConfig;
use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub struct SourceScanner {
    config: SourcesConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size: u64,
}

impl SourceScanner {
    pub fn new(config: SourcesConfig) -> Self {
        Self { config }
    }

    /// Files are returned in configuration order; directory entries expand to
    /// their PDFs sorted by path.
    pub fn scan(&self) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for entry in &self.config.paths {
            if entry.is_dir() {
                files.extend(self.scan_directory(entry)?);
            } else if entry.is_file() {
                files.push(self.check_file(entry)?);
            } else {
                return Err(PipelineError::Validation(format!(
                    "Source does not exist: {}",
                    entry.display()
                )));
            }
        }

        info!("Resolved {} source PDF files", files.len());
        Ok(files)
    }

    fn scan_directory(&self, root: &Path) -> Result<Vec<SourceFile>> {
        debug!("Scanning directory: {}", root.display());
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| PipelineError::FileOperation {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() || !Validator::has_pdf_extension(entry.path()) {
                continue;
            }

            match self.check_file(entry.path()) {
                Ok(file) => files.push(file),
                Err(PipelineError::Validation(reason)) => {
                    warn!("Skipping {}: {}", entry.path().display(), reason)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(files)
    }

    fn check_file(&self, path: &Path) -> Result<SourceFile> {
        Validator::validate_pdf_extension(path)?;

        let metadata = std::fs::metadata(path).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

        let size = metadata.len();
        let max_size = (self.config.max_file_size_mb * 1024 * 1024) as u64;
        if size > max_size {
            return Err(PipelineError::Validation(format!(
                "File exceeds {} MB limit: {}",
                self.config.max_file_size_mb,
                path.display()
            )));
        }

        Ok(SourceFile {
            path: path.to_path_buf(),
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(paths: Vec<PathBuf>) -> SourcesConfig {
        SourcesConfig {
            paths,
            max_file_size_mb: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_scan_directory_finds_pdfs_in_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.pdf"), b"%PDF").unwrap();
        fs::write(temp.path().join("a.PDF"), b"%PDF").unwrap();
        fs::write(temp.path().join("notes.txt"), b"text").unwrap();

        let scanner = SourceScanner::new(config(vec![temp.path().to_path_buf()]));
        let files = scanner.scan().unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_explicit_file_must_be_pdf() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, b"text").unwrap();

        let scanner = SourceScanner::new(config(vec![path]));
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn test_oversized_pdf_in_directory_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("small.pdf"), b"%PDF").unwrap();
        fs::write(temp.path().join("large.pdf"), vec![b'x'; 2 * 1024 * 1024]).unwrap();

        let scanner = SourceScanner::new(SourcesConfig {
            paths: vec![temp.path().to_path_buf()],
            max_file_size_mb: 1,
            ..Default::default()
        });
        let files = scanner.scan().unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("small.pdf"));
    }

    #[test]
    fn test_missing_source_is_error() {
        let scanner = SourceScanner::new(config(vec![PathBuf::from("/nonexistent/x.pdf")]));
        assert!(scanner.scan().is_err());
    }
}
