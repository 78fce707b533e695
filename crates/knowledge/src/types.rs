//! Knowledge system type definitions.

use crate::chunk::{ChunkMetadata, ChunkingOptions, ChunkingOverrides};
use crate::parser::ContentType;
use chrono::{DateTime, Utc};
use docqa_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for a knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base
    #[serde(default)]
    pub name: String,

    /// Embedding provider ("trigram", "ollama")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Embedding model
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Embedding endpoint for network providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Chunking strategy used when a document does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Overrides applied on top of the selected strategy
    #[serde(default, skip_serializing_if = "ChunkingOverrides::is_empty")]
    pub chunking: ChunkingOverrides,

    /// Number of chunks retrieved per question
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Chunks scoring below this are not used as context
    #[serde(default)]
    pub min_relevance_score: f32,
}

fn default_provider() -> String {
    "trigram".to_string()
}

fn default_model() -> String {
    "trigram-v1".to_string()
}

fn default_embedding_dim() -> usize {
    384
}

fn default_retrieval_limit() -> usize {
    5
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: default_provider(),
            model: default_model(),
            embedding_dim: default_embedding_dim(),
            endpoint: None,
            strategy: None,
            chunking: ChunkingOverrides::default(),
            retrieval_limit: default_retrieval_limit(),
            min_relevance_score: 0.0,
        }
    }
}

/// Processing state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(AppError::Knowledge(format!(
                "Unknown document status: {}",
                other
            ))),
        }
    }
}

/// A document registered in a knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,

    /// File name without directories
    pub filename: String,

    pub file_type: ContentType,

    /// Path the document was ingested from
    pub path: String,

    /// SHA-256 of the file contents
    pub content_hash: String,

    pub size_bytes: u64,

    pub status: DocumentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub chunk_count: u32,

    /// Chunking strategy used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

/// A stored chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Owning document
    pub document_id: String,

    /// Position within the document
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    pub metadata: ChunkMetadata,
}

/// A question/answer pair asked against one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Options for the ingest operation.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Knowledge base name
    pub base_name: String,

    /// Files or directories to ingest
    pub paths: Vec<PathBuf>,

    /// Chunking strategy name
    pub strategy: Option<String>,

    /// Overrides applied on top of the strategy
    pub overrides: ChunkingOverrides,

    /// Re-ingest documents whose content is already present
    pub force: bool,
}

/// Statistics from an ingest operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    pub documents_processed: u32,
    pub documents_skipped: u32,
    pub documents_failed: u32,
    pub chunks_stored: u32,
    pub bytes_processed: u64,
    pub duration_secs: f64,
}

/// Options for the ask operation.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Knowledge base name
    pub base_name: String,

    /// Question text
    pub question: String,

    /// Restrict retrieval to one document
    pub document_id: Option<String>,

    /// Number of chunks to retrieve; the base's limit when unset
    pub limit: Option<usize>,

    /// Sampling temperature; the prompt's when unset
    pub temperature: Option<f32>,
}

/// Result of chunking a single file without storing it.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPreview {
    pub path: String,
    pub content_type: ContentType,
    pub strategy: String,
    pub options: ChunkingOptions,
    pub page_count: usize,
    pub chunks: Vec<crate::chunk::Chunk>,
}

/// Statistics for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStats {
    /// Base name
    pub base_name: String,

    pub documents_count: u32,

    pub chunks_count: u32,

    /// Documents per status
    pub completed_count: u32,
    pub failed_count: u32,

    /// Database size in bytes
    pub db_size_bytes: u64,

    /// Last time a document finished processing
    pub last_processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_partial_yaml() {
        let config: KnowledgeBaseConfig =
            serde_yaml::from_str("provider: ollama\nmodel: nomic-embed-text\nembeddingDim: 768\n")
                .unwrap();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.embedding_dim, 768);
        assert_eq!(config.retrieval_limit, 5);
        assert_eq!(config.min_relevance_score, 0.0);
        assert!(config.chunking.is_empty());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            DocumentStatus::Processing,
            DocumentStatus::Completed,
            DocumentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<DocumentStatus>().unwrap(), status);
        }
        assert!("done".parse::<DocumentStatus>().is_err());
    }
}
