//! Filtered vector search for RAG.

use crate::embeddings::EmbeddingProvider;
use crate::types::KnowledgeChunk;
use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default number of chunks retrieved per question.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Options for filtered vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Only search chunks of this document
    pub document_id: Option<String>,

    /// Minimum relevance score
    pub min_score: Option<f32>,

    /// Maximum number of results
    pub limit: usize,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            document_id: None,
            min_score: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Drop low scores, order best first and keep the top `limit`.
    ///
    /// Ties keep document order.
    pub fn apply(&self, mut results: Vec<(KnowledgeChunk, f32)>) -> Vec<(KnowledgeChunk, f32)> {
        if let Some(min_score) = self.min_score {
            results.retain(|(_, score)| *score >= min_score);
        }

        if let Some(document_id) = &self.document_id {
            results.retain(|(chunk, _)| &chunk.document_id == document_id);
        }

        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.document_id.cmp(&b.0.document_id))
                .then_with(|| a.0.position.cmp(&b.0.position))
        });
        results.truncate(self.limit);
        results
    }
}

/// Embed the question and retrieve the closest chunks.
pub async fn search(
    index: &dyn VectorIndex,
    provider: &dyn EmbeddingProvider,
    question: &str,
    filters: &SearchFilters,
) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
    if question.trim().is_empty() {
        return Err(AppError::Knowledge("Question is empty".to_string()));
    }

    let query_embedding = provider.embed(question).await?;
    let results = index.search(&query_embedding, filters)?;

    tracing::debug!(
        document = ?filters.document_id,
        "Retrieved {} chunks (limit {})",
        results.len(),
        filters.limit
    );

    Ok(results)
}
