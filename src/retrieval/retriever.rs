//! Query-time retrieval over the collection store

use super::{RetrievalQuery, RetrievedChunk};
use crate::embedding::{EmbeddingProvider, EmbeddingSpaces};
use crate::error::{NotedexError, Result};
use crate::store::{CollectionKind, CollectionStore};
use std::sync::Arc;

/// Embeds queries and serves filtered top-k retrieval per collection
pub struct Retriever {
    store: Arc<CollectionStore>,
    spaces: EmbeddingSpaces,
}

impl Retriever {
    pub fn new(store: Arc<CollectionStore>, spaces: EmbeddingSpaces) -> Self {
        Self { store, spaces }
    }

    /// Retrieve the top-k chunks for `query` from one collection.
    ///
    /// Only entries owned by `allowed_documents` are candidates; an empty
    /// set yields an empty result rather than widening the search.
    pub fn retrieve(
        &self,
        kind: CollectionKind,
        query: &RetrievalQuery,
    ) -> Result<Vec<RetrievedChunk>> {
        if query.k == 0 {
            return Err(NotedexError::InvalidArgument(
                "k must be a positive integer".to_string(),
            ));
        }
        if query.text.trim().is_empty() {
            return Err(NotedexError::InvalidArgument(
                "query text cannot be empty".to_string(),
            ));
        }
        if query.allowed_documents.is_empty() {
            tracing::debug!("retrieval with empty document filter; returning no results");
            return Ok(Vec::new());
        }

        let embedding = self.provider(kind).embed_one(&query.text)?;
        let hits = self.store.search(
            kind.collection_name(),
            &embedding,
            query.k,
            &query.allowed_documents,
        )?;

        let mut results: Vec<RetrievedChunk> = hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                text: hit.text,
                score: hit.score,
                document_id: hit.metadata.document_id,
                document_name: hit.metadata.document_name,
                sequence_index: hit.metadata.sequence_index,
            })
            .collect();

        if let Some(floor) = query.min_score {
            results.retain(|r| r.score > floor);
        }

        tracing::debug!(
            "Retrieved {} results from '{}' for {}-document filter",
            results.len(),
            kind.collection_name(),
            query.allowed_documents.len()
        );

        Ok(results)
    }

    fn provider(&self, kind: CollectionKind) -> &Arc<dyn EmbeddingProvider> {
        match kind {
            CollectionKind::Text => &self.spaces.text,
            CollectionKind::Image => &self.spaces.image,
        }
    }
}
