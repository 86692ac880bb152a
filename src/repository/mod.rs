// file: src/repository/mod.rs
// description: source document discovery module exports
// reference: internal module structure

pub mod scanner;

pub use scanner::{SourceFile, SourceScanner};
