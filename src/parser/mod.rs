// file: src/parser/mod.rs
// description: pdf conversion and preprocessing module exports
// reference: internal module structure

pub mod cleaner;
pub mod pdf;
pub mod splitter;

pub use cleaner::DocumentCleaner;
pub use pdf::{PAGE_BREAK, PdfConverter};
pub use splitter::{DocumentSplitter, SplitBy};
