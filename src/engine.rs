//! Engine facade
//!
//! One explicitly constructed object owns the store and the two embedding
//! spaces and wires them into the pipeline and retriever. Callers hold an
//! [`Engine`] for the process lifetime and pass it by reference; there is
//! no hidden global state, and tests swap the embedding backends through
//! [`Engine::with_providers`].

use crate::config::Config;
use crate::embedding::EmbeddingSpaces;
use crate::error::Result;
use crate::ingest::{IngestReport, IngestRequest, IngestionPipeline};
use crate::retrieval::{
    classify_sufficiency, RetrievalQuery, RetrievedChunk, Retriever, Sufficiency,
};
use crate::store::{
    CollectionKind, CollectionSpec, CollectionStore, DeleteReport, DocumentInfo, DocumentSet,
    StoreStats, IMAGE_COLLECTION, TEXT_COLLECTION,
};
use std::sync::Arc;

const DB_FILE: &str = "notedex.sqlite";

pub struct Engine {
    config: Config,
    store: Arc<CollectionStore>,
    pipeline: IngestionPipeline,
    retriever: Retriever,
}

impl Engine {
    /// Open the engine with FastEmbed providers built from the config
    pub fn open(config: Config) -> Result<Self> {
        let spaces = EmbeddingSpaces::from_config(&config.embedding)?;
        Self::with_providers(config, spaces)
    }

    /// Open the engine with caller-supplied embedding providers.
    ///
    /// The collections are declared with the providers' dimensions and
    /// model names, so a store built with one backend refuses to open with
    /// a different one.
    pub fn with_providers(config: Config, spaces: EmbeddingSpaces) -> Result<Self> {
        let data_dir = config.storage.resolved_data_dir()?;
        std::fs::create_dir_all(&data_dir).map_err(|e| crate::error::NotedexError::Io {
            source: e,
            context: format!("Failed to create data directory: {}", data_dir.display()),
        })?;

        let specs = [
            CollectionSpec {
                name: TEXT_COLLECTION.to_string(),
                dimension: spaces.text.dimension(),
                model: spaces.text.model_name().to_string(),
            },
            CollectionSpec {
                name: IMAGE_COLLECTION.to_string(),
                dimension: spaces.image.dimension(),
                model: spaces.image.model_name().to_string(),
            },
        ];

        let store = Arc::new(CollectionStore::open(&data_dir.join(DB_FILE), &specs)?);
        let pipeline =
            IngestionPipeline::new(store.clone(), spaces.clone(), config.chunking.clone());
        let retriever = Retriever::new(store.clone(), spaces);

        tracing::debug!("Engine opened with store at {}", data_dir.display());

        Ok(Self {
            config,
            store,
            pipeline,
            retriever,
        })
    }

    /// Index one extracted document; see [`IngestionPipeline::ingest`]
    pub fn ingest(&self, request: &IngestRequest) -> Result<IngestReport> {
        self.pipeline.ingest(request)
    }

    /// Retrieve ranked chunks from one collection
    pub fn retrieve(
        &self,
        kind: CollectionKind,
        query: &RetrievalQuery,
    ) -> Result<Vec<RetrievedChunk>> {
        self.retriever.retrieve(kind, query)
    }

    /// Build a query with this collection's configured k and score floor
    pub fn default_query(
        &self,
        kind: CollectionKind,
        text: impl Into<String>,
        allowed_documents: DocumentSet,
    ) -> RetrievalQuery {
        let knobs = self.config.retrieval.for_kind(kind);
        RetrievalQuery::new(text, allowed_documents, knobs.default_k)
            .with_min_score(knobs.min_score)
    }

    /// Classify a result set against the configured thresholds
    pub fn sufficiency(&self, results: &[RetrievedChunk]) -> (Sufficiency, f32) {
        classify_sufficiency(results, &self.config.retrieval.sufficiency)
    }

    /// Remove documents and everything derived from them
    pub fn delete(&self, document_ids: &DocumentSet) -> Result<DeleteReport> {
        self.store.delete(document_ids)
    }

    /// All stored documents in ingestion order
    pub fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        self.store.list_documents()
    }

    /// Store-wide counts
    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
