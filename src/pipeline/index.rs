// file: src/pipeline/index.rs
// description: converts source PDFs into embedded chunks held by an in-memory document store

use crate::config::{Config, SourcesConfig, StoreConfig};
use crate::embedding::TextEmbedder;
use crate::error::{PipelineError, Result};
use crate::models::Document;
use crate::parser::{DocumentCleaner, DocumentSplitter, PdfConverter};
use crate::repository::{SourceFile, SourceScanner};
use crate::store::InMemoryDocumentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct IndexPipeline {
    sources: SourcesConfig,
    cleaner: DocumentCleaner,
    splitter: DocumentSplitter,
    embedder: Arc<dyn TextEmbedder>,
    store_config: StoreConfig,
}

#[derive(Debug)]
pub struct IndexOutput {
    pub store: InMemoryDocumentStore,
    pub sources: usize,
}

impl IndexPipeline {
    pub fn new(config: &Config, embedder: Arc<dyn TextEmbedder>) -> Result<Self> {
        Ok(Self {
            sources: config.sources.clone(),
            cleaner: DocumentCleaner::from_config(&config.preprocessing)?,
            splitter: DocumentSplitter::from_config(&config.preprocessing)?,
            embedder,
            store_config: config.store.clone(),
        })
    }

    /// Scans, converts and indexes every configured source into a fresh store.
    pub async fn run(&self) -> Result<IndexOutput> {
        let scanner = SourceScanner::new(self.sources.clone());
        let files = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| {
                PipelineError::Io(std::io::Error::other(format!(
                    "Source scanning task failed: {}",
                    e
                )))
            })??;

        if files.is_empty() {
            warn!("No source PDFs found; the document store will be empty");
        }

        let sources = files.len();
        let documents = convert_sources(files).await?;

        let mut store = InMemoryDocumentStore::from_config(&self.store_config);
        self.index_documents(documents, &mut store).await?;

        Ok(IndexOutput {
            store,
            sources,
        })
    }

    /// Clean, split, embed and write already converted documents. Returns the
    /// number of chunks written.
    pub async fn index_documents(
        &self,
        documents: Vec<Document>,
        store: &mut InMemoryDocumentStore,
    ) -> Result<usize> {
        let cleaned = self.cleaner.clean_all(&documents);
        let chunks = self.splitter.split_all(&cleaned);
        info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        if chunks.is_empty() {
            return Ok(0);
        }

        let embedded = self.embedder.embed_documents(chunks).await?;
        store.write_documents(embedded, self.store_config.duplicate_policy)
    }
}

async fn convert_sources(files: Vec<SourceFile>) -> Result<Vec<Document>> {
    let paths: Vec<PathBuf> = files.into_iter().map(|file| file.path).collect();

    tokio::task::spawn_blocking(move || PdfConverter::new().convert_all(&paths))
        .await
        .map_err(|e| {
            PipelineError::Io(std::io::Error::other(format!(
                "PDF conversion task failed: {}",
                e
            )))
        })?
}
