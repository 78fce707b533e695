//! Embedding settings derived from a knowledge base's config.

use crate::types::KnowledgeBaseConfig;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Providers `create_provider` knows how to build.
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Chunks embedded per request during ingestion.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Embedding configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Base URL for network providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_base(&KnowledgeBaseConfig::default())
    }
}

impl EmbeddingConfig {
    /// Embedding settings of an already loaded base config.
    pub fn from_base(base: &KnowledgeBaseConfig) -> Self {
        Self {
            provider: base.provider.to_lowercase(),
            model: base.model.clone(),
            dimensions: base.embedding_dim,
            endpoint: base.endpoint.clone(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Load embedding settings from `.docqa/knowledge/<base>/config.yaml`.
    pub fn load(workspace: &Path, base_name: &str) -> AppResult<Self> {
        let base = crate::config::load_config(workspace, base_name)?;
        let config = Self::from_base(&base);
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no provider can satisfy.
    pub fn validate(&self) -> AppResult<()> {
        if !SUPPORTED_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Knowledge(format!(
                "Unknown embedding provider: '{}'. Supported providers: {}",
                self.provider,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }

        if self.dimensions == 0 {
            return Err(AppError::Knowledge(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(AppError::Knowledge(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Check the configured dimensions against vectors already stored.
    pub fn validate_consistency(&self, stored_dimensions: Option<usize>) -> AppResult<()> {
        match stored_dimensions {
            Some(stored) if stored != self.dimensions => Err(AppError::Knowledge(format!(
                "Index holds {}-dimensional embeddings but provider '{}' is configured for {}. \
                 Run `docqa clean` before switching embedding models.",
                stored, self.provider, self.dimensions
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_base_config() {
        let temp = TempDir::new().unwrap();
        let base = KnowledgeBaseConfig {
            name: "manuals".to_string(),
            provider: "Ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            endpoint: Some("http://gpu-box:11434".to_string()),
            ..Default::default()
        };
        crate::config::save_config(temp.path(), &base).unwrap();

        let config = EmbeddingConfig::load(temp.path(), "manuals").unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let unknown = EmbeddingConfig {
            provider: "gguf".to_string(),
            ..Default::default()
        };
        assert!(unknown
            .validate()
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));

        let zero = EmbeddingConfig {
            dimensions: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_validate_consistency() {
        let config = EmbeddingConfig::default();
        assert!(config.validate_consistency(None).is_ok());
        assert!(config.validate_consistency(Some(384)).is_ok());
        assert!(config.validate_consistency(Some(768)).is_err());
    }
}
