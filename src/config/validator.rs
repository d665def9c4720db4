use crate::config::Config;
use crate::embedding::{FastEmbedProvider, SpaceConfig};
use crate::error::{Result, ValidationError, NotedexError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_chunking(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotedexError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory path cannot be empty",
            ));
        }
    }

    fn validate_chunking(config: &Config, errors: &mut Vec<ValidationError>) {
        let chunking = &config.chunking;
        if chunking.chunk_size == 0 {
            errors.push(ValidationError::new(
                "chunking.chunk_size",
                "Chunk size must be greater than 0",
            ));
        } else if chunking.overlap >= chunking.chunk_size {
            errors.push(ValidationError::new(
                "chunking.overlap",
                format!(
                    "Overlap ({}) must be smaller than chunk_size ({})",
                    chunking.overlap, chunking.chunk_size
                ),
            ));
        }
        if chunking.min_paragraph_len == 0 {
            errors.push(ValidationError::new(
                "chunking.min_paragraph_len",
                "Minimum paragraph length must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        Self::validate_space("embedding.text", &config.embedding.text, errors);
        Self::validate_space("embedding.image", &config.embedding.image, errors);
    }

    fn validate_space(path: &str, space: &SpaceConfig, errors: &mut Vec<ValidationError>) {
        if space.batch_size == 0 {
            errors.push(ValidationError::new(
                format!("{}.batch_size", path),
                "Batch size must be greater than 0",
            ));
        }

        match FastEmbedProvider::lookup(&space.model) {
            Ok((_, dimension)) => {
                if dimension != space.dimension {
                    errors.push(ValidationError::new(
                        format!("{}.dimension", path),
                        format!(
                            "Model {} produces {}-dimensional vectors, not {}",
                            space.model, dimension, space.dimension
                        ),
                    ));
                }
            }
            Err(e) => {
                errors.push(ValidationError::new(format!("{}.model", path), e.to_string()));
            }
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        for (path, knobs) in [
            ("retrieval.text", &config.retrieval.text),
            ("retrieval.image", &config.retrieval.image),
        ] {
            if knobs.default_k == 0 {
                errors.push(ValidationError::new(
                    format!("{}.default_k", path),
                    "Default k must be at least 1",
                ));
            }
            if !(-1.0..=1.0).contains(&knobs.min_score) {
                errors.push(ValidationError::new(
                    format!("{}.min_score", path),
                    "Score floor must be within [-1, 1]",
                ));
            }
        }

        let sufficiency = &config.retrieval.sufficiency;
        for (key, value) in [
            ("high_score", sufficiency.high_score),
            ("mean_score", sufficiency.mean_score),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                errors.push(ValidationError::new(
                    format!("retrieval.sufficiency.{}", key),
                    "Threshold must be within [-1, 1]",
                ));
            }
        }
    }
}
