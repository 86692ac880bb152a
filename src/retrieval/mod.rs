// file: src/retrieval/mod.rs
// description: candidate retrieval and joining module exports
// reference: internal module structure

pub mod bm25;
pub mod joiner;
pub mod retrievers;

pub use bm25::{Bm25Index, Bm25Parameters};
pub use joiner::{DocumentJoiner, JoinMode};
pub use retrievers::{Bm25Retriever, EmbeddingRetriever};
