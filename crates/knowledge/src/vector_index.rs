//! Vector index abstraction for knowledge chunks.

use crate::rag::SearchFilters;
use crate::types::KnowledgeChunk;
use docqa_core::AppResult;

/// Storage backend for embedded chunks.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a chunk and its embedding.
    fn upsert_chunk(&mut self, chunk: &KnowledgeChunk) -> AppResult<()>;

    /// Store a document's chunks together.
    fn upsert_chunks(&mut self, chunks: &[KnowledgeChunk]) -> AppResult<()> {
        for chunk in chunks {
            self.upsert_chunk(chunk)?;
        }
        Ok(())
    }

    /// Chunks most similar to `query_embedding`, best first.
    fn search(
        &self,
        query_embedding: &[f32],
        filters: &SearchFilters,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>>;

    /// Returns (documents_count, chunks_count).
    fn stats(&self) -> AppResult<(u32, u32)>;

    /// Remove everything.
    fn reset(&mut self) -> AppResult<()>;
}
