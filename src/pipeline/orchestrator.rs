// file: src/pipeline/orchestrator.rs
// description: builds the backends from configuration and runs index, generate and evaluate in order
// reference: sequential three-stage RAG workflow

use crate::config::{Config, RankerBackend};
use crate::embedding::{OllamaEmbedder, TextEmbedder};
use crate::error::Result;
use crate::evaluation::{FaithfulnessEvaluator, FaithfulnessScorer};
use crate::exporter::{ExportManifest, JsonExporter};
use crate::generation::{ChatGenerator, OllamaChatGenerator};
use crate::models::EvaluationReport;
use crate::pipeline::evaluate::EvaluationPipeline;
use crate::pipeline::generate::GeneratePipeline;
use crate::pipeline::index::{IndexOutput, IndexPipeline};
use crate::pipeline::progress::PipelineStats;
use crate::ranking::{CrossEncoderRanker, EmbeddingSimilarityRanker, Ranker};
use crate::store::InMemoryDocumentStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Backends behind the capability traits.
pub struct Components {
    pub embedder: Arc<dyn TextEmbedder>,
    pub ranker: Arc<dyn Ranker>,
    pub llm: Arc<dyn ChatGenerator>,
    pub scorer: Arc<dyn FaithfulnessScorer>,
}

impl Components {
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn TextEmbedder> =
            Arc::new(OllamaEmbedder::new(config.embedder.clone())?);

        let ranker: Arc<dyn Ranker> = match config.ranker.backend {
            RankerBackend::Embedding => Arc::new(
                EmbeddingSimilarityRanker::new(embedder.clone())
                    .with_scale_score(config.ranker.scale_score)
                    .with_score_threshold(config.ranker.score_threshold),
            ),
            RankerBackend::CrossEncoder => {
                Arc::new(CrossEncoderRanker::new(config.ranker.clone())?)
            }
        };

        Ok(Self {
            embedder,
            ranker,
            llm: Arc::new(OllamaChatGenerator::new(config.llm.clone())?),
            scorer: Arc::new(FaithfulnessEvaluator::new(config.evaluator.clone())?),
        })
    }
}

pub struct PipelineOrchestrator {
    config: Config,
    components: Components,
    exporter: JsonExporter,
    show_progress: bool,
}

impl PipelineOrchestrator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let components = Components::from_config(&config)?;
        Ok(Self::with_components(config, components))
    }

    pub fn with_components(config: Config, components: Components) -> Self {
        let exporter = JsonExporter::new(config.output.pretty);
        Self {
            config,
            components,
            exporter,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn index(&self) -> Result<IndexOutput> {
        info!("Starting indexing...");
        let pipeline = IndexPipeline::new(&self.config, self.components.embedder.clone())?;
        let output = pipeline.run().await?;
        info!(
            "Indexing complete. {} documents from {} sources",
            output.store.count(),
            output.sources
        );
        Ok(output)
    }

    /// Answers every input query against `store` and writes the answers file.
    pub async fn generate(&self, store: Arc<InMemoryDocumentStore>) -> Result<ExportManifest> {
        info!("Starting query generation...");
        let queries = JsonExporter::read_input_json(&self.config.sources.input_queries)?;

        let pipeline = GeneratePipeline::new(
            &self.config,
            store,
            self.components.embedder.clone(),
            self.components.ranker.clone(),
            self.components.llm.clone(),
        )?
        .with_progress(self.show_progress);

        let records = pipeline.run(&queries).await?;
        let manifest = self
            .exporter
            .write_generated_answers(&self.config.output.generated_answers, &records)?;
        info!("Query generation complete.");
        Ok(manifest)
    }

    pub async fn evaluate(&self, generated_answers: &Path) -> Result<EvaluationReport> {
        info!("Starting evaluation...");
        let answers = JsonExporter::read_generated_answers(generated_answers)?;

        let outcome = EvaluationPipeline::new(self.components.scorer.clone())
            .with_progress(self.show_progress)
            .run(&answers)
            .await?;

        let report = self.exporter.write_evaluation_report(
            &self.config.output.evaluation_results,
            outcome.results,
            outcome.skipped,
        )?;
        info!(
            "Evaluation complete. {} evaluated, {} skipped",
            report.evaluated, report.skipped
        );
        Ok(report)
    }

    /// Runs the three stages in order; any unrecoverable error stops the run.
    pub async fn run(&self) -> Result<PipelineStats> {
        info!("Starting RAG pipeline run {}", self.exporter.run_id());
        let start = Instant::now();

        let indexed = self.index().await?;
        let mut stats = PipelineStats {
            sources_indexed: indexed.sources,
            documents_indexed: indexed.store.count(),
            ..Default::default()
        };

        let manifest = self.generate(Arc::new(indexed.store)).await?;
        stats.queries_answered = manifest.total_records;

        let report = self.evaluate(&manifest.path).await?;
        stats.items_evaluated = report.evaluated;
        stats.items_skipped = report.skipped;
        stats.mean_score = report.mean_score;
        stats.duration_secs = start.elapsed().as_secs();

        self.log_final_stats(&stats);
        Ok(stats)
    }

    fn log_final_stats(&self, stats: &PipelineStats) {
        info!("=== Pipeline Execution Summary ===");
        for line in stats.summary_lines() {
            info!("{}", line);
        }
        info!("==================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::error::PipelineError;
    use crate::generation::ChatMessage;
    use crate::models::{Document, DocumentMeta, EvaluationResult};
    use crate::store::DuplicatePolicy;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct CannedGenerator;

    #[async_trait]
    impl ChatGenerator for CannedGenerator {
        fn model(&self) -> &str {
            "canned"
        }

        async fn run(&self, _messages: &[ChatMessage]) -> Result<Vec<ChatMessage>> {
            Ok(vec![ChatMessage::from_assistant("The final is on May 12.")])
        }
    }

    /// Rejects questions mentioning "parking" as malformed.
    struct KeywordScorer;

    #[async_trait]
    impl FaithfulnessScorer for KeywordScorer {
        async fn score(
            &self,
            question: &str,
            contexts: &[String],
            predicted_answer: &str,
        ) -> Result<EvaluationResult> {
            if question.contains("parking") {
                return Err(PipelineError::Validation("no statements".to_string()));
            }
            let supported = contexts.iter().any(|c| c.contains("May 12"));
            Ok(EvaluationResult {
                query: question.to_string(),
                predicted_answer: predicted_answer.to_string(),
                score: if supported { 1.0 } else { 0.0 },
                statements: vec![predicted_answer.to_string()],
                statement_scores: vec![u8::from(supported)],
            })
        }
    }

    fn orchestrator(dir: &TempDir) -> PipelineOrchestrator {
        let input = dir.path().join("input.json");
        fs::write(
            &input,
            r#"[
                {"question": "When is the final exam?", "answer": "May 12"},
                {"question": "Where is parking?", "answer": ""}
            ]"#,
        )
        .unwrap();

        let sources = dir.path().join("sources");
        fs::create_dir_all(&sources).unwrap();

        let mut config = Config::default_config();
        config.sources.paths = vec![sources];
        config.sources.input_queries = input;
        config.output.generated_answers = dir.path().join("out/generated_answers.json");
        config.output.evaluation_results = dir.path().join("out/evaluation_results.json");

        let embedder: Arc<dyn TextEmbedder> = Arc::new(HashingEmbedder::new(64));
        let components = Components {
            ranker: Arc::new(EmbeddingSimilarityRanker::new(embedder.clone())),
            embedder,
            llm: Arc::new(CannedGenerator),
            scorer: Arc::new(KeywordScorer),
        };

        PipelineOrchestrator::with_components(config, components).with_progress(false)
    }

    #[tokio::test]
    async fn test_run_with_no_sources_still_completes() {
        let dir = TempDir::new().unwrap();
        let stats = orchestrator(&dir).run().await.unwrap();

        assert_eq!(stats.documents_indexed, 0);
        assert_eq!(stats.queries_answered, 2);
        assert_eq!(stats.items_evaluated, 1);
        assert_eq!(stats.items_skipped, 1);
        assert!(dir.path().join("out/evaluation_results.json").exists());
    }

    #[tokio::test]
    async fn test_generate_then_evaluate_against_prepared_store() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir);

        let embedder = HashingEmbedder::new(64);
        let documents = embedder
            .embed_documents(vec![Document::new(
                "The final exam is on May 12.".to_string(),
                DocumentMeta::default(),
            )])
            .await
            .unwrap();
        let mut store = InMemoryDocumentStore::from_config(&orchestrator.config().store);
        store
            .write_documents(documents, DuplicatePolicy::Fail)
            .unwrap();

        let manifest = orchestrator.generate(Arc::new(store)).await.unwrap();
        assert_eq!(manifest.total_records, 2);

        let report = orchestrator.evaluate(&manifest.path).await.unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.mean_score, Some(1.0));
    }

    #[tokio::test]
    async fn test_missing_input_file_aborts_generation() {
        let dir = TempDir::new().unwrap();
        let mut orchestrator = orchestrator(&dir);
        orchestrator.config.sources.input_queries = dir.path().join("missing.json");

        let store = Arc::new(InMemoryDocumentStore::from_config(&Default::default()));
        assert!(orchestrator.generate(store).await.is_err());
    }

    #[test]
    fn test_cross_encoder_backend_selected_from_config() {
        let mut config = Config::default_config();
        config.ranker.backend = RankerBackend::CrossEncoder;

        assert!(Components::from_config(&config).is_ok());
        assert!(PipelineOrchestrator::new(config).is_ok());
    }
}
