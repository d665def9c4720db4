//! Configuration management
//!
//! TOML-backed configuration for the storage location, chunking policy,
//! embedding spaces, and retrieval tuning. Loaded once at startup,
//! validated before use, with a small set of environment overrides.

use crate::chunk::ChunkConfig;
use crate::embedding::EmbeddingConfig;
use crate::error::{NotedexError, Result};
use crate::retrieval::SufficiencyThresholds;
use crate::store::CollectionKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    pub chunking: ChunkConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Data directory with a leading `~` expanded
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        let raw = self.data_dir.to_string_lossy();
        if let Some(rest) = raw.strip_prefix("~/") {
            let home = dirs::home_dir()
                .ok_or_else(|| NotedexError::Config("Cannot determine home directory".to_string()))?;
            return Ok(home.join(rest));
        }
        Ok(self.data_dir.clone())
    }
}

/// Retrieval tuning, separate per collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub text: CollectionRetrieval,
    pub image: CollectionRetrieval,
    pub sufficiency: SufficiencyThresholds,
}

/// Per-collection retrieval knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollectionRetrieval {
    /// Result count when the caller does not specify one
    pub default_k: usize,
    /// Relevance floor applied by default; results at or below are dropped
    pub min_score: f32,
}

impl RetrievalConfig {
    pub fn for_kind(&self, kind: CollectionKind) -> &CollectionRetrieval {
        match kind {
            CollectionKind::Text => &self.text,
            CollectionKind::Image => &self.image,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            // Q&A wants precision; keep the floor above noise level
            text: CollectionRetrieval {
                default_k: 5,
                min_score: 0.1,
            },
            // Image descriptions are sparser; favor recall over precision
            image: CollectionRetrieval {
                default_k: 3,
                min_score: 0.0,
            },
            sufficiency: SufficiencyThresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NotedexError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| NotedexError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| NotedexError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| NotedexError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: NOTEDEX_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("NOTEDEX_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "STORAGE__DATA_DIR" => {
                self.storage.data_dir = PathBuf::from(value);
            }
            "EMBEDDING__TEXT_MODEL" => {
                self.embedding.text.model = value.to_string();
            }
            "EMBEDDING__IMAGE_MODEL" => {
                self.embedding.image.model = value.to_string();
            }
            "RETRIEVAL__TEXT_K" => {
                self.retrieval.text.default_k =
                    value.parse().map_err(|_| NotedexError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "RETRIEVAL__IMAGE_K" => {
                self.retrieval.image.default_k =
                    value.parse().map_err(|_| NotedexError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NotedexError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("notedex").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("~/.notedex"),
            },
            chunking: ChunkConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}
