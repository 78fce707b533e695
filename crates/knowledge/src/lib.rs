//! Document question answering over local knowledge bases.
//!
//! Documents are extracted, chunked along their structure, embedded and
//! stored in a per-base SQLite file; questions are answered by an LLM from
//! the closest chunks.

pub mod chunk;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod parser;
pub mod progress;
pub mod rag;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunk::{chunk_pdf_text, chunk_text, Chunk, ChunkMetadata, ChunkingOptions, ChunkingOverrides};
pub use index::SqliteIndex;
pub use parser::ContentType;
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{RagResponse, RagSourceRef, RetrievedChunk, SearchFilters};
pub use types::{
    AskOptions, BaseStats, ChunkPreview, DocumentRecord, DocumentStatus, HistoryEntry,
    IngestOptions, IngestStats, KnowledgeBaseConfig, KnowledgeChunk,
};

use docqa_core::{AppError, AppResult};
use docqa_llm::LlmClient;
use embeddings::{EmbeddingConfig, EmbeddingEngine};
use std::path::Path;
use vector_index::VectorIndex;

/// Open the index of a base that must already exist.
fn open_existing(workspace: &Path, base_name: &str) -> AppResult<SqliteIndex> {
    let index_path = config::get_index_path(workspace, base_name);
    if !index_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist. Run 'docqa ingest {} <paths>' first.",
            base_name, base_name
        )));
    }
    SqliteIndex::open(&index_path)
}

/// Extract and chunk one file without storing anything.
pub fn chunk_file(
    path: &Path,
    strategy: Option<&str>,
    overrides: &ChunkingOverrides,
) -> AppResult<ChunkPreview> {
    if let Some(name) = strategy {
        if chunk::find_strategy(name).is_none() {
            return Err(AppError::Knowledge(format!(
                "Unknown chunking strategy '{}'",
                name
            )));
        }
    }

    let extracted = parser::extract(path)?;
    let selected = chunk::get_chunking_strategy(Some(extracted.content_type), strategy);
    let options = chunk::resolve_options(&selected.options, overrides);

    let chunks = match extracted.content_type {
        ContentType::Pdf => chunk_pdf_text(&extracted.text, &extracted.page_breaks, &options),
        ContentType::PlainText | ContentType::Markdown => chunk_text(&extracted.text, &options),
    };

    Ok(ChunkPreview {
        path: path.display().to_string(),
        content_type: extracted.content_type,
        strategy: selected.name.to_string(),
        options,
        page_count: extracted.page_count,
        chunks,
    })
}

/// Ingest files and directories into a knowledge base, creating it if needed.
pub async fn ingest(
    workspace: &Path,
    options: IngestOptions,
    reporter: &ProgressReporter,
) -> AppResult<IngestStats> {
    tracing::info!("Starting ingest for base '{}'", options.base_name);

    let config = config::load_config(workspace, &options.base_name)?;
    config::save_config(workspace, &config)?;

    let mut index = SqliteIndex::open(&config::get_index_path(workspace, &options.base_name))?;

    let engine = EmbeddingEngine::new(workspace.to_path_buf());
    let provider = engine.provider_for(&options.base_name).await?;
    EmbeddingConfig::from_base(&config).validate_consistency(index.embedding_dimension()?)?;

    let mut ingestor = ingest::Ingestor {
        index: &mut index,
        embeddings: provider.as_ref(),
        config: &config,
        reporter,
    };
    ingestor.run(&options).await
}

/// Answer a question from a knowledge base.
///
/// `model` is passed to `llm` unchanged.
pub async fn ask(
    workspace: &Path,
    options: AskOptions,
    llm: &dyn LlmClient,
    model: &str,
) -> AppResult<RagResponse> {
    tracing::info!(
        "Answering from base '{}': {}",
        options.base_name,
        options.question
    );

    let config = config::load_config(workspace, &options.base_name)?;
    let index = open_existing(workspace, &options.base_name)?;

    let engine = EmbeddingEngine::new(workspace.to_path_buf());
    let provider = engine.provider_for(&options.base_name).await?;
    EmbeddingConfig::from_base(&config).validate_consistency(index.embedding_dimension()?)?;

    let prompt = docqa_prompt::load_prompt(workspace, docqa_prompt::ANSWER_PROMPT_ID)?;

    let mut filters = SearchFilters::new()
        .with_limit(options.limit.unwrap_or(config.retrieval_limit).max(1))
        .with_min_score(config.min_relevance_score);
    if let Some(document_id) = &options.document_id {
        filters = filters.with_document(document_id.clone());
    }

    let answerer = rag::Answerer {
        index: &index,
        embeddings: provider.as_ref(),
        llm,
        model,
        prompt: &prompt,
    };
    answerer.ask(&options, &filters).await
}

/// All documents in a base.
pub fn list_documents(workspace: &Path, base_name: &str) -> AppResult<Vec<DocumentRecord>> {
    open_existing(workspace, base_name)?.list_documents()
}

/// One document's record.
pub fn document_status(
    workspace: &Path,
    base_name: &str,
    document_id: &str,
) -> AppResult<DocumentRecord> {
    open_existing(workspace, base_name)?
        .get_document(document_id)?
        .ok_or_else(|| AppError::Knowledge(format!("Document '{}' not found", document_id)))
}

/// Delete a document with its chunks and history.
pub fn remove_document(workspace: &Path, base_name: &str, document_id: &str) -> AppResult<()> {
    let index = open_existing(workspace, base_name)?;
    if !index.delete_document(document_id)? {
        return Err(AppError::Knowledge(format!(
            "Document '{}' not found",
            document_id
        )));
    }

    tracing::info!("Removed document {} from '{}'", document_id, base_name);
    Ok(())
}

/// Recent questions, newest first.
pub fn history(
    workspace: &Path,
    base_name: &str,
    document_id: Option<&str>,
    limit: usize,
) -> AppResult<Vec<HistoryEntry>> {
    open_existing(workspace, base_name)?.list_history(document_id, limit)
}

/// Clean (reset) a knowledge base.
pub fn clean(workspace: &Path, base_name: &str) -> AppResult<()> {
    tracing::info!("Cleaning knowledge base '{}'", base_name);

    let mut index = open_existing(workspace, base_name)?;
    index.reset()?;

    tracing::info!("Knowledge base '{}' cleaned", base_name);
    Ok(())
}

/// Get statistics for a knowledge base.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    let index = open_existing(workspace, base_name)?;
    let (documents_count, chunks_count) = index.stats()?;

    let index_path = config::get_index_path(workspace, base_name);
    let db_size_bytes = std::fs::metadata(&index_path).map(|m| m.len()).unwrap_or(0);

    Ok(BaseStats {
        base_name: base_name.to_string(),
        documents_count,
        chunks_count,
        completed_count: index.count_with_status(DocumentStatus::Completed)?,
        failed_count: index.count_with_status(DocumentStatus::Failed)?,
        db_size_bytes,
        last_processed_at: index.last_processed_at()?,
    })
}
