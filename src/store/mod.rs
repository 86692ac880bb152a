// file: src/store/mod.rs
// description: document store module exports
// reference: internal module structure

pub mod memory;

pub use memory::{DuplicatePolicy, InMemoryDocumentStore, SimilarityFunction};
