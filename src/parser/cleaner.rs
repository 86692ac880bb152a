// file: src/parser/cleaner.rs
// description: page-aware text cleanup applied before splitting
// reference: line oriented normalization passes

use crate::config::PreprocessingConfig;
use crate::error::{PipelineError, Result};
use crate::models::Document;
use crate::parser::pdf::PAGE_BREAK;
use regex::Regex;
use std::collections::HashSet;

pub struct DocumentCleaner {
    remove_empty_lines: bool,
    remove_extra_whitespaces: bool,
    remove_repeated_substrings: bool,
    remove_regex: Option<Regex>,
    whitespace: Regex,
}

impl DocumentCleaner {
    pub fn new() -> Self {
        Self::from_config(&PreprocessingConfig::default())
            .expect("default cleaner configuration has no custom regex")
    }

    pub fn from_config(config: &PreprocessingConfig) -> Result<Self> {
        let remove_regex = config
            .remove_regex
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| PipelineError::Config(format!("Invalid remove_regex: {}", e)))?;

        Ok(Self {
            remove_empty_lines: config.remove_empty_lines,
            remove_extra_whitespaces: config.remove_extra_whitespaces,
            remove_repeated_substrings: config.remove_repeated_substrings,
            remove_regex,
            whitespace: Regex::new(r"\s\s+").map_err(|e| PipelineError::Config(e.to_string()))?,
        })
    }

    pub fn clean(&self, document: &Document) -> Document {
        let mut text = document.content.clone();

        if self.remove_empty_lines {
            text = self.clean_empty_lines(&text);
        }

        if self.remove_extra_whitespaces {
            text = self.clean_whitespaces(&text);
        }

        if self.remove_repeated_substrings {
            text = self.clean_repeated_lines(&text);
        }

        if let Some(regex) = &self.remove_regex {
            text = regex.replace_all(&text, "").into_owned();
        }

        let mut cleaned = document.clone();
        cleaned.content = text;
        cleaned.refresh_id();
        cleaned
    }

    pub fn clean_all(&self, documents: &[Document]) -> Vec<Document> {
        documents.iter().map(|doc| self.clean(doc)).collect()
    }

    fn clean_empty_lines(&self, text: &str) -> String {
        map_pages(text, |page| {
            page.lines()
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn clean_whitespaces(&self, text: &str) -> String {
        map_pages(text, |page| {
            self.whitespace.replace_all(page, " ").trim().to_string()
        })
    }

    /// Drops header and footer lines that repeat on every page.
    fn clean_repeated_lines(&self, text: &str) -> String {
        let pages: Vec<&str> = text.split(PAGE_BREAK).collect();
        if pages.len() < 2 {
            return text.to_string();
        }

        let mut repeated: Option<HashSet<&str>> = None;
        for page in &pages {
            let lines: HashSet<&str> = page
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            repeated = Some(match repeated {
                None => lines,
                Some(seen) => seen.intersection(&lines).copied().collect(),
            });
        }

        let repeated = repeated.unwrap_or_default();
        if repeated.is_empty() {
            return text.to_string();
        }

        map_pages(text, |page| {
            page.lines()
                .filter(|line| !repeated.contains(line.trim()))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

impl Default for DocumentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn map_pages(text: &str, f: impl Fn(&str) -> String) -> String {
    text.split(PAGE_BREAK)
        .map(f)
        .collect::<Vec<_>>()
        .join(&PAGE_BREAK.to_string())
}
