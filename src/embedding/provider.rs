/// Embedding provider trait and FastEmbed implementation
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    Initialization(String),

    #[error("Embedding generation failed: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for embedding providers
///
/// Allows abstraction over different embedding backends, and lets tests
/// inject deterministic in-memory providers.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generate embeddings for multiple texts, one output per input in order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// FastEmbed provider for local embedding generation
///
/// **Important**: models are downloaded on-demand to `~/.cache/huggingface/`
/// on first use. Supported models:
/// - all-MiniLM-L6-v2: 90MB (384 dims) - default for document chunks
/// - bge-small-en-v1.5: 130MB (384 dims) - default for image descriptions
/// - bge-base-en-v1.5: 440MB (768 dims) - highest accuracy
///
/// The model is loaded lazily behind an initialization barrier, so
/// constructing a provider is cheap and concurrent first-use callers share
/// a single load.
pub struct FastEmbedProvider {
    model_name: String,
    embedding_model: EmbeddingModel,
    dimension: usize,
    batch_size: usize,
    model: OnceLock<Arc<TextEmbedding>>,
    init_lock: Mutex<()>,
}

impl FastEmbedProvider {
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        Self::with_batch_size(model_name, 32)
    }

    pub fn with_batch_size(model_name: &str, batch_size: usize) -> Result<Self, EmbeddingError> {
        let (embedding_model, dimension) = Self::lookup(model_name)?;

        Ok(Self {
            model_name: model_name.to_string(),
            embedding_model,
            dimension,
            batch_size: batch_size.max(1),
            model: OnceLock::new(),
            init_lock: Mutex::new(()),
        })
    }

    /// Map a model name to the FastEmbed enum and its dimension
    pub fn lookup(model_name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
        match model_name {
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
            "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
            "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
            _ => Err(EmbeddingError::Initialization(format!(
                "Unsupported model: {}. Supported: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5",
                model_name
            ))),
        }
    }

    /// Get the loaded model, loading it on first use.
    ///
    /// The mutex serializes loading; losers of the race reuse the winner's
    /// model instead of triggering their own download.
    fn model(&self) -> Result<Arc<TextEmbedding>, EmbeddingError> {
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        let _guard = self.init_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        tracing::info!(
            "Loading embedding model: {} ({}D, downloaded if not cached)",
            self.model_name,
            self.dimension
        );

        let init_options =
            InitOptions::new(self.embedding_model.clone()).with_show_download_progress(true);
        let model = TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::Initialization(e.to_string()))?;

        let model = Arc::new(model);
        let _ = self.model.set(model.clone());
        Ok(model)
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let embeddings = self
            .model()?
            .embed(vec![text.to_string()], None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;

        let embedding = embeddings.into_iter().next().ok_or_else(|| {
            EmbeddingError::Generation("No embeddings generated".to_string())
        })?;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // An empty element would silently shift outputs against inputs;
        // reject instead of filtering.
        if let Some(pos) = texts.iter().position(|t| t.is_empty()) {
            return Err(EmbeddingError::InvalidInput(format!(
                "Empty text at position {}",
                pos
            )));
        }

        let embeddings = self
            .model()?
            .embed(texts.to_vec(), Some(self.batch_size))
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::Generation(format!(
                "Embedding count mismatch: expected {}, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        for embedding in &embeddings {
            if embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
