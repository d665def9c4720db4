//! Retrieval
//!
//! Embeds a query into the collection's embedding space, searches the
//! allowed subset of documents, and shapes ranked results for the caller.
//! A sufficiency classifier summarizes the score distribution so the
//! answer-generation layer can decide how much to lean on retrieved
//! content.

mod retriever;
mod sufficiency;

pub use retriever::Retriever;
pub use sufficiency::{classify_sufficiency, Sufficiency, SufficiencyThresholds};

use crate::store::DocumentSet;
use serde::Serialize;

/// A retrieval request: what to search for, where it may look, how much to
/// return
#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    /// Query text
    pub text: String,

    /// Documents the search is allowed to touch; empty means no results
    pub allowed_documents: DocumentSet,

    /// Maximum number of results; must be at least 1
    pub k: usize,

    /// Optional relevance floor: results scoring at or below are dropped.
    /// A post-filter, since the right floor depends on the call site.
    pub min_score: Option<f32>,
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>, allowed_documents: DocumentSet, k: usize) -> Self {
        Self {
            text: text.into(),
            allowed_documents,
            k,
            min_score: None,
        }
    }

    pub fn with_min_score(mut self, floor: f32) -> Self {
        self.min_score = Some(floor);
        self
    }
}

/// One ranked retrieval result
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
    pub document_id: String,
    pub document_name: String,
    pub sequence_index: usize,
}
