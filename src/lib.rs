// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod exporter;
pub mod generation;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod ranking;
pub mod repository;
pub mod retrieval;
pub mod store;
pub mod utils;

pub use config::{
    Config, EmbedderConfig, EvaluatorConfig, LlmConfig, OutputConfig, PreprocessingConfig,
    RankerBackend, RankerConfig, RetrievalConfig, SourcesConfig, StoreConfig,
};
pub use embedding::{HashingEmbedder, OllamaEmbedder, TextEmbedder};
pub use error::{PipelineError, Result};
pub use evaluation::{FaithfulnessEvaluator, FaithfulnessScorer};
pub use exporter::{ExportManifest, GeneratedAnswerSet, JsonExporter};
pub use generation::{
    AnswerBuilder, ChatGenerator, ChatMessage, ChatPromptBuilder, ChatRole, OllamaChatGenerator,
};
pub use models::{
    AnswerRecord, Document, DocumentMeta, EvaluationReport, EvaluationResult, GeneratedAnswer,
    QueryRecord,
};
pub use parser::{DocumentCleaner, DocumentSplitter, PdfConverter, SplitBy};
pub use pipeline::{
    Components, EvaluationPipeline, GeneratePipeline, IndexPipeline, PipelineGraph,
    PipelineOrchestrator, PipelineStats, ProgressTracker,
};
pub use ranking::{CrossEncoderRanker, EmbeddingSimilarityRanker, Ranker};
pub use repository::{SourceFile, SourceScanner};
pub use retrieval::{Bm25Retriever, DocumentJoiner, EmbeddingRetriever, JoinMode};
pub use store::{DuplicatePolicy, InMemoryDocumentStore, SimilarityFunction};
pub use utils::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let _graph = pipeline::graph::generate_graph();
        let _exporter = JsonExporter::new(config.output.pretty);
        let _builder = ChatPromptBuilder::rag(None);
    }
}
