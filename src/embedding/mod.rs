//! Embedding generation
//!
//! Two independent embedding spaces back the engine: one for document text
//! chunks and one for externally produced image descriptions. The spaces
//! use different models, are declared with fixed dimensions, and are never
//! compared against each other.

mod provider;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for one embedding space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub model: String,
    /// Embedding dimension the collection is declared with
    pub dimension: usize,
    /// Batch size for chunk embedding
    pub batch_size: usize,
}

/// Configuration for both embedding spaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub text: SpaceConfig,
    pub image: SpaceConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            text: SpaceConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                dimension: 384,
                batch_size: 32,
            },
            image: SpaceConfig {
                model: "bge-small-en-v1.5".to_string(),
                dimension: 384,
                batch_size: 16,
            },
        }
    }
}

/// The two provider handles, constructed once and shared by reference
#[derive(Clone)]
pub struct EmbeddingSpaces {
    pub text: Arc<dyn EmbeddingProvider>,
    pub image: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingSpaces {
    pub fn new(text: Arc<dyn EmbeddingProvider>, image: Arc<dyn EmbeddingProvider>) -> Self {
        Self { text, image }
    }

    /// Build FastEmbed providers for both spaces.
    ///
    /// Declared dimensions are checked against the models here, before any
    /// model weights load, so a misconfigured space fails fast.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let text = FastEmbedProvider::with_batch_size(&config.text.model, config.text.batch_size)?;
        if text.dimension() != config.text.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: config.text.dimension,
                actual: text.dimension(),
            });
        }

        let image =
            FastEmbedProvider::with_batch_size(&config.image.model, config.image.batch_size)?;
        if image.dimension() != config.image.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: config.image.dimension,
                actual: image.dimension(),
            });
        }

        Ok(Self {
            text: Arc::new(text),
            image: Arc::new(image),
        })
    }
}
