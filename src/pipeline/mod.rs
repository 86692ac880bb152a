// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod evaluate;
pub mod generate;
pub mod graph;
pub mod index;
mod orchestrator;
mod progress;

pub use evaluate::{EvaluationOutcome, EvaluationPipeline};
pub use generate::GeneratePipeline;
pub use graph::PipelineGraph;
pub use index::{IndexOutput, IndexPipeline};
pub use orchestrator::{Components, PipelineOrchestrator};
pub use progress::{PipelineStats, ProgressTracker};
