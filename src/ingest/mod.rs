//! Ingestion pipeline
//!
//! Turns one extracted document into indexed entries: chunk the text, embed
//! chunks in one batch against the text space, embed each image description
//! against the image space, then commit everything in a single store
//! transaction. A document is either fully indexed or not indexed at all.

use crate::chunk::{self, ChunkConfig};
use crate::embedding::EmbeddingSpaces;
use crate::error::{NotedexError, Result};
use crate::store::{
    CollectionKind, CollectionStore, DocumentRecord, EntryMetadata, EntryRecord,
    IMAGE_COLLECTION, TEXT_COLLECTION,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// One document to ingest, already extracted by the upload layer
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Document id; a fresh uuid is generated when absent
    pub document_id: Option<String>,
    /// Display name shown in listings
    pub document_name: String,
    /// Extracted text; may be empty for image-only documents
    pub text: String,
    /// Externally produced description of each extracted image, in order
    pub image_descriptions: Vec<String>,
    /// Chunking override; engine defaults apply when absent
    pub chunk_config: Option<ChunkConfig>,
}

impl IngestRequest {
    pub fn new(document_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: None,
            document_name: document_name.into(),
            text: text.into(),
            image_descriptions: Vec::new(),
            chunk_config: None,
        }
    }
}

/// Counts reported back to the caller after a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub text_chunks: usize,
    pub images: usize,
}

/// Chunker -> embedder -> store orchestration for new documents
pub struct IngestionPipeline {
    store: Arc<CollectionStore>,
    spaces: EmbeddingSpaces,
    defaults: ChunkConfig,
}

impl IngestionPipeline {
    pub fn new(store: Arc<CollectionStore>, spaces: EmbeddingSpaces, defaults: ChunkConfig) -> Self {
        Self {
            store,
            spaces,
            defaults,
        }
    }

    /// Index one document.
    ///
    /// All embedding happens before the store is touched, and the commit is
    /// one transaction, so any failure leaves no trace of the document.
    pub fn ingest(&self, request: &IngestRequest) -> Result<IngestReport> {
        let chunk_config = request.chunk_config.clone().unwrap_or_else(|| self.defaults.clone());
        chunk_config.validate()?;

        let chunks = chunk::chunk(&request.text, &chunk_config)?;

        let descriptions: Vec<(usize, String)> = request
            .image_descriptions
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.trim().is_empty())
            .map(|(i, d)| (i, d.trim().to_string()))
            .collect();

        if chunks.is_empty() && descriptions.is_empty() {
            return Err(NotedexError::InvalidArgument(
                "document has no indexable content".to_string(),
            ));
        }

        let document_id = request
            .document_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let chunk_vectors = if chunks.is_empty() {
            Vec::new()
        } else {
            self.spaces.text.embed_batch(&chunks)?
        };
        if chunk_vectors.len() != chunks.len() {
            return Err(NotedexError::PartialIngestion {
                document_id,
                reason: format!(
                    "embedding returned {} vectors for {} chunks",
                    chunk_vectors.len(),
                    chunks.len()
                ),
            });
        }

        let mut described_images = Vec::with_capacity(descriptions.len());
        for (index, description) in descriptions {
            let vector = self.spaces.image.embed_one(&description)?;
            described_images.push((index, description, vector));
        }

        let origin = match (chunks.is_empty(), described_images.is_empty()) {
            (false, true) => "text",
            (true, false) => "image",
            _ => "mixed",
        };
        let document = DocumentRecord {
            id: document_id.clone(),
            name: request.document_name.clone(),
            origin: origin.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };

        match self.commit(&document, &chunks, &chunk_vectors, &described_images) {
            Ok(()) => {}
            // Entry ids are fresh uuids per attempt; a collision is a bug
            // signal, handled by one retry with new ids.
            Err(NotedexError::DuplicateId { collection, id }) => {
                tracing::warn!(
                    "Duplicate entry id '{}' in '{}' while ingesting '{}'; retrying with fresh ids",
                    id,
                    collection,
                    document.id
                );
                self.commit(&document, &chunks, &chunk_vectors, &described_images)?;
            }
            Err(e) => {
                return Err(NotedexError::PartialIngestion {
                    document_id,
                    reason: e.to_string(),
                })
            }
        }

        tracing::info!(
            "Ingested document '{}' ({}): {} text chunks, {} image descriptions",
            document.name,
            document.id,
            chunks.len(),
            described_images.len()
        );

        Ok(IngestReport {
            document_id,
            text_chunks: chunks.len(),
            images: described_images.len(),
        })
    }

    fn commit(
        &self,
        document: &DocumentRecord,
        chunks: &[String],
        chunk_vectors: &[Vec<f32>],
        images: &[(usize, String, Vec<f32>)],
    ) -> Result<()> {
        let text_entries: Vec<EntryRecord> = chunks
            .iter()
            .zip(chunk_vectors.iter())
            .enumerate()
            .map(|(index, (text, vector))| EntryRecord {
                id: Uuid::new_v4().to_string(),
                vector: vector.clone(),
                text: text.clone(),
                metadata: EntryMetadata {
                    document_id: document.id.clone(),
                    document_name: document.name.clone(),
                    sequence_index: index,
                    content_type: CollectionKind::Text.content_type().to_string(),
                },
            })
            .collect();

        let image_entries: Vec<EntryRecord> = images
            .iter()
            .map(|(index, description, vector)| EntryRecord {
                id: Uuid::new_v4().to_string(),
                vector: vector.clone(),
                text: description.clone(),
                metadata: EntryMetadata {
                    document_id: document.id.clone(),
                    document_name: document.name.clone(),
                    sequence_index: *index,
                    content_type: CollectionKind::Image.content_type().to_string(),
                },
            })
            .collect();

        self.store.commit_document(
            document,
            &[
                (TEXT_COLLECTION, text_entries.as_slice()),
                (IMAGE_COLLECTION, image_entries.as_slice()),
            ],
        )
    }
}
