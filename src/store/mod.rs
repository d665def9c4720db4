//! Durable vector collection store
//!
//! Two named collections (text chunks and image descriptions) live in one
//! sqlite database together with the documents that own their entries.
//! Every read and write goes through [`CollectionStore`]; nothing else
//! touches the database file, so the API boundary is where concurrency and
//! isolation are enforced.

mod collection;
mod database;

pub use collection::CollectionStore;
pub use database::{Database, DbPool};

use ahash::HashSet;
use serde::{Deserialize, Serialize};

/// Collection holding embedded document text chunks
pub const TEXT_COLLECTION: &str = "text_chunks";
/// Collection holding embedded image descriptions
pub const IMAGE_COLLECTION: &str = "image_descriptions";

/// Selects one of the two collections and its embedding space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Text,
    Image,
}

impl CollectionKind {
    pub fn collection_name(self) -> &'static str {
        match self {
            CollectionKind::Text => TEXT_COLLECTION,
            CollectionKind::Image => IMAGE_COLLECTION,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            CollectionKind::Text => "text",
            CollectionKind::Image => "image",
        }
    }
}

/// Declaration of a collection: its name, vector dimension, and the model
/// that produced (and must keep producing) its vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub model: String,
}

/// Metadata stored with every entry; `document_id` scopes all retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub document_id: String,
    pub document_name: String,
    pub sequence_index: usize,
    pub content_type: String,
}

/// One entry to insert: caller-supplied unique id, vector, source text
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: EntryMetadata,
}

/// One ranked search result
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: EntryMetadata,
    /// Cosine similarity in [-1, 1]; higher is more similar
    pub score: f32,
}

/// An ingested source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    /// Content origin: "text", "image", or "mixed"
    pub origin: String,
    /// Unix timestamp of ingestion
    pub created_at: i64,
}

/// Listing entry for stored documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub document_name: String,
}

/// The set of document ids a search is allowed to touch.
///
/// Passed structurally instead of as a backend query fragment, so the
/// backing engine can change without touching callers. An empty set means
/// "nothing is authorized" and always produces an empty result.
pub type DocumentSet = HashSet<String>;

/// Counts removed by a delete call, per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub documents: usize,
    pub text_entries: usize,
    pub image_entries: usize,
}

impl DeleteReport {
    pub fn total_entries(&self) -> usize {
        self.text_entries + self.image_entries
    }
}

/// Store-wide counts for status reporting
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreStats {
    pub documents: usize,
    pub text_entries: usize,
    pub image_entries: usize,
}
