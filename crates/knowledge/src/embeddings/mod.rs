//! Embedding engine for knowledge bases.
//!
//! Each base picks its provider in its own config; the engine builds one
//! provider per base and reuses it.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use crate::chunk::Chunk;
use docqa_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Manages embedding providers per knowledge base.
pub struct EmbeddingEngine {
    workspace: PathBuf,
    providers: Arc<RwLock<HashMap<String, Arc<dyn EmbeddingProvider>>>>,
}

impl EmbeddingEngine {
    pub fn new(workspace: PathBuf) -> Self {
        Self {
            workspace,
            providers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get or create the provider for a knowledge base.
    pub async fn provider_for(&self, base_name: &str) -> AppResult<Arc<dyn EmbeddingProvider>> {
        if let Some(provider) = self.cached(base_name)? {
            return Ok(provider);
        }

        let config = EmbeddingConfig::load(&self.workspace, base_name)?;
        tracing::debug!(
            "Creating embedding provider for base '{}': provider={}, model={}, dimensions={}",
            base_name,
            config.provider,
            config.model,
            config.dimensions
        );

        let provider = create_provider(&config).await?;

        self.providers
            .write()
            .map_err(|_| AppError::Knowledge("Embedding provider cache poisoned".to_string()))?
            .insert(base_name.to_string(), Arc::clone(&provider));

        Ok(provider)
    }

    fn cached(&self, base_name: &str) -> AppResult<Option<Arc<dyn EmbeddingProvider>>> {
        let providers = self
            .providers
            .read()
            .map_err(|_| AppError::Knowledge("Embedding provider cache poisoned".to_string()))?;
        Ok(providers.get(base_name).cloned())
    }

    /// Embed texts with a base's provider.
    pub async fn embed_texts(&self, base_name: &str, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider_for(base_name).await?;
        tracing::info!(
            "Embedding {} texts for base '{}' using provider '{}' (model: {})",
            texts.len(),
            base_name,
            provider.provider_name(),
            provider.model_name()
        );

        provider.embed_batch(texts).await
    }

    pub async fn embed_chunks(&self, base_name: &str, chunks: &[Chunk]) -> AppResult<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        self.embed_texts(base_name, &texts).await
    }
}
