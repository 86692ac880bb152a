// file: src/pipeline/generate.rs
// description: hybrid retrieval, re-ranking and chat generation for each input query

use crate::config::Config;
use crate::embedding::TextEmbedder;
use crate::error::Result;
use crate::generation::{AnswerBuilder, ChatGenerator, ChatPromptBuilder};
use crate::models::{AnswerRecord, GeneratedAnswer, QueryRecord};
use crate::pipeline::progress::ProgressTracker;
use crate::ranking::Ranker;
use crate::retrieval::{Bm25Retriever, DocumentJoiner, EmbeddingRetriever};
use crate::store::InMemoryDocumentStore;
use crate::utils::Validator;
use std::sync::Arc;
use tracing::debug;

pub struct GeneratePipeline {
    text_embedder: Arc<dyn TextEmbedder>,
    embedding_retriever: EmbeddingRetriever,
    bm25_retriever: Bm25Retriever,
    joiner: DocumentJoiner,
    ranker: Arc<dyn Ranker>,
    ranker_top_k: usize,
    prompt_builder: ChatPromptBuilder,
    llm: Arc<dyn ChatGenerator>,
    answer_builder: AnswerBuilder,
    show_progress: bool,
}

impl GeneratePipeline {
    pub fn new(
        config: &Config,
        store: Arc<InMemoryDocumentStore>,
        text_embedder: Arc<dyn TextEmbedder>,
        ranker: Arc<dyn Ranker>,
        llm: Arc<dyn ChatGenerator>,
    ) -> Result<Self> {
        let retrieval = &config.retrieval;
        let mut joiner =
            DocumentJoiner::new(retrieval.join_mode).with_top_k(retrieval.join_top_k);
        if let Some(weights) = &retrieval.join_weights {
            joiner = joiner.with_weights(weights.clone());
        }

        Ok(Self {
            text_embedder,
            embedding_retriever: EmbeddingRetriever::new(store.clone(), retrieval.embedding_top_k)
                .with_scale_score(retrieval.scale_score),
            bm25_retriever: Bm25Retriever::new(store, retrieval.bm25_top_k)
                .with_scale_score(retrieval.scale_score),
            joiner,
            ranker,
            ranker_top_k: config.ranker.top_k,
            prompt_builder: ChatPromptBuilder::rag(config.llm.system_prompt.as_deref()),
            llm,
            answer_builder: AnswerBuilder::from_config(&config.llm)?,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs one query through the whole graph.
    pub async fn answer(&self, query: &str) -> Result<GeneratedAnswer> {
        let query_embedding = self.text_embedder.embed(query).await?;

        let by_embedding = self.embedding_retriever.run(&query_embedding)?;
        let by_keyword = self.bm25_retriever.run(query);
        debug!(
            "Retrieved {} by embedding, {} by BM25",
            by_embedding.len(),
            by_keyword.len()
        );

        let joined = self.joiner.run(vec![by_embedding, by_keyword])?;
        let ranked = self
            .ranker
            .rank_embedded(query, &query_embedding, joined, self.ranker_top_k)
            .await?;

        let messages = self.prompt_builder.run(query, &ranked)?;
        let replies = self.llm.run(&messages).await?;

        let mut answer = self.answer_builder.run(query, &replies, ranked);
        answer
            .meta
            .insert("model".to_string(), self.llm.model().to_string());
        Ok(answer)
    }

    /// One record per query, in input order. The first failure aborts the run.
    pub async fn run(&self, queries: &[QueryRecord]) -> Result<Vec<AnswerRecord>> {
        let progress = if self.show_progress {
            ProgressTracker::new(queries.len())
        } else {
            ProgressTracker::hidden(queries.len())
        };

        let mut records = Vec::with_capacity(queries.len());
        for record in queries {
            progress.set_message(Validator::truncate_text(&record.question, 40));
            let generated_answer = self.answer(&record.question).await?;
            records.push(AnswerRecord {
                reference_answer: record.answer.clone(),
                generated_answer,
            });
            progress.inc_completed();
        }

        progress.finish();
        Ok(records)
    }
}
