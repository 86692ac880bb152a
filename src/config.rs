// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::parser::SplitBy;
use crate::retrieval::JoinMode;
use crate::store::{DuplicatePolicy, SimilarityFunction};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// PDF files or directories containing PDF files
    pub paths: Vec<PathBuf>,
    pub input_queries: PathBuf,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub remove_empty_lines: bool,
    pub remove_extra_whitespaces: bool,
    pub remove_repeated_substrings: bool,
    pub remove_regex: Option<String>,
    pub split_by: SplitBy,
    pub split_length: usize,
    pub split_overlap: usize,
    pub split_threshold: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub base_url: String,
    pub model: String,
    pub num_ctx: u32,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub similarity: SimilarityFunction,
    pub bm25_k1: f32,
    pub bm25_b: f32,
    /// Floor for non-positive IDF values, as a fraction of the average IDF
    pub bm25_epsilon: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub embedding_top_k: usize,
    pub bm25_top_k: usize,
    /// Scale retriever scores into [0, 1]
    pub scale_score: bool,
    pub join_mode: JoinMode,
    /// One weight per retriever, embedding first; equal weights when unset
    pub join_weights: Option<Vec<f32>>,
    pub join_top_k: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankerBackend {
    /// Cosine similarity between query and document embeddings
    Embedding,
    /// Remote cross-encoder exposing a `/rerank` endpoint
    CrossEncoder,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RankerConfig {
    pub backend: RankerBackend,
    pub base_url: String,
    pub model: String,
    pub top_k: usize,
    pub scale_score: bool,
    pub score_threshold: Option<f32>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub seed: Option<i64>,
    pub num_ctx: Option<u32>,
    pub timeout_secs: u64,
    /// Overrides the built-in system prompt when set
    pub system_prompt: Option<String>,
    pub answer_pattern: Option<String>,
    pub reference_pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub generated_answers: PathBuf,
    pub evaluation_results: PathBuf,
    pub pretty: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("documents/source_documents/test.pdf")],
            input_queries: PathBuf::from("documents/input/input.json"),
            max_file_size_mb: 50,
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            remove_empty_lines: true,
            remove_extra_whitespaces: true,
            remove_repeated_substrings: false,
            remove_regex: None,
            split_by: SplitBy::Word,
            split_length: 200,
            split_overlap: 0,
            split_threshold: 0,
        }
    }
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "snowflake-arctic-embed2".to_string(),
            num_ctx: 8192,
            batch_size: 32,
            timeout_secs: 120,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Fail,
            similarity: SimilarityFunction::DotProduct,
            bm25_k1: 1.5,
            bm25_b: 0.75,
            bm25_epsilon: 0.25,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_top_k: 10,
            bm25_top_k: 10,
            scale_score: false,
            join_mode: JoinMode::Concatenate,
            join_weights: None,
            join_top_k: None,
        }
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            backend: RankerBackend::Embedding,
            base_url: "http://localhost:8080".to_string(),
            model: "BAAI/bge-reranker-v2-m3".to_string(),
            top_k: 3,
            scale_score: true,
            score_threshold: None,
            timeout_secs: 60,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:latest".to_string(),
            seed: Some(42),
            num_ctx: None,
            timeout_secs: 300,
            system_prompt: None,
            answer_pattern: None,
            reference_pattern: None,
        }
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:11434/v1".to_string(),
            api_key: "test-api-key".to_string(),
            model: "qwen2.5:latest".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generated_answers: PathBuf::from("documents/output/generated_answers.json"),
            evaluation_results: PathBuf::from("documents/output/evaluation_results.json"),
            pretty: true,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PDF_RAG")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.preprocessing.split_length == 0 {
            return Err(PipelineError::Config(
                "split_length must be greater than 0".to_string(),
            ));
        }

        if self.preprocessing.split_overlap >= self.preprocessing.split_length {
            return Err(PipelineError::Config(
                "split_overlap must be smaller than split_length".to_string(),
            ));
        }

        if self.embedder.batch_size == 0 {
            return Err(PipelineError::Config(
                "embedder batch_size must be greater than 0".to_string(),
            ));
        }

        for (name, top_k) in [
            ("retrieval.embedding_top_k", self.retrieval.embedding_top_k),
            ("retrieval.bm25_top_k", self.retrieval.bm25_top_k),
            ("ranker.top_k", self.ranker.top_k),
        ] {
            if top_k == 0 {
                return Err(PipelineError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if let Some(weights) = &self.retrieval.join_weights
            && weights.len() != 2
        {
            return Err(PipelineError::Config(format!(
                "retrieval.join_weights needs one weight per retriever (2), got {}",
                weights.len()
            )));
        }

        for (name, model) in [
            ("embedder.model", &self.embedder.model),
            ("llm.model", &self.llm.model),
            ("evaluator.model", &self.evaluator.model),
        ] {
            if model.trim().is_empty() {
                return Err(PipelineError::Config(format!("{} must not be empty", name)));
            }
        }

        let mut urls = vec![
            ("embedder.base_url", &self.embedder.base_url),
            ("llm.base_url", &self.llm.base_url),
            ("evaluator.api_base_url", &self.evaluator.api_base_url),
        ];
        if self.ranker.backend == RankerBackend::CrossEncoder {
            urls.push(("ranker.base_url", &self.ranker.base_url));
        }
        for (name, url) in urls {
            Validator::validate_url(url).map_err(|_| {
                PipelineError::Config(format!("{} must be an http(s) URL, got '{}'", name, url))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.ranker.top_k, 3);
        assert_eq!(config.preprocessing.split_length, 200);
        assert_eq!(config.llm.seed, Some(42));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_length() {
        let mut config = Config::default_config();
        config.preprocessing.split_overlap = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = Config::default_config();
        config.retrieval.bm25_top_k = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retrieval.bm25_top_k"));
    }

    #[test]
    fn test_join_weights_need_one_per_retriever() {
        let mut config = Config::default_config();
        config.retrieval.join_weights = Some(vec![0.7, 0.3]);
        assert!(config.validate().is_ok());

        config.retrieval.join_weights = Some(vec![1.0]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_urls_must_be_http() {
        let mut config = Config::default_config();
        config.llm.base_url = "localhost:11434".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm.base_url"));
    }

    #[test]
    fn test_load_partial_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pdf_rag.toml");
        fs::write(
            &path,
            r#"
[sources]
paths = ["docs/handbook.pdf"]

[ranker]
top_k = 5
backend = "cross_encoder"

[retrieval]
join_mode = "reciprocal_rank_fusion"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.sources.paths, vec![PathBuf::from("docs/handbook.pdf")]);
        assert_eq!(config.ranker.top_k, 5);
        assert_eq!(config.ranker.backend, RankerBackend::CrossEncoder);
        assert_eq!(config.retrieval.join_mode, JoinMode::ReciprocalRankFusion);
        assert_eq!(config.embedder.model, "snowflake-arctic-embed2");
    }
}
