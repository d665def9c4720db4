use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the notedex engine
#[derive(Error, Debug)]
pub enum NotedexError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Caller-supplied argument rejected (zero k, bad chunk config, empty content)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Vector length disagrees with the collection's declared dimensionality
    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// Entry id already present in the collection
    #[error("Duplicate entry id '{id}' in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    /// Collection name not declared at store open time
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Backing store unreachable or timed out; distinguishable from "no matches"
    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Ingestion aborted before commit; no entries of the document are visible
    #[error("Ingestion of document '{document_id}' failed before commit: {reason}")]
    PartialIngestion { document_id: String, reason: String },

    /// Embedding backend errors
    #[error("Embedding error: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for notedex operations
pub type Result<T> = std::result::Result<T, NotedexError>;
