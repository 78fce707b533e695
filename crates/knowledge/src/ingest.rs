//! Document ingestion: extract, chunk, embed and store.

use crate::chunk::{self, find_strategy, get_chunking_strategy, resolve_options, Chunk};
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use crate::index::SqliteIndex;
use crate::parser::{self, ContentType};
use crate::progress::ProgressReporter;
use crate::types::{
    DocumentRecord, DocumentStatus, IngestOptions, IngestStats, KnowledgeBaseConfig,
    KnowledgeChunk,
};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use docqa_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;
use walkdir::WalkDir;

/// What happened to one file.
enum FileOutcome {
    Stored { chunks: u32, bytes: u64 },
    Skipped,
}

/// Runs the ingest pipeline against one knowledge base.
pub struct Ingestor<'a> {
    pub index: &'a mut SqliteIndex,
    pub embeddings: &'a dyn EmbeddingProvider,
    pub config: &'a KnowledgeBaseConfig,
    pub reporter: &'a ProgressReporter,
}

impl Ingestor<'_> {
    /// Ingest every supported file under `options.paths`.
    ///
    /// A failing file is recorded as failed and does not stop the run.
    pub async fn run(&mut self, options: &IngestOptions) -> AppResult<IngestStats> {
        let start = Instant::now();

        if let Some(name) = options.strategy.as_deref() {
            if find_strategy(name).is_none() {
                return Err(AppError::Knowledge(format!(
                    "Unknown chunking strategy '{}'",
                    name
                )));
            }
        }

        let files = discover_files(&options.paths, self.reporter)?;
        let total = files.len() as u64;
        let mut stats = IngestStats::default();

        for (i, path) in files.iter().enumerate() {
            let current = i as u64 + 1;
            let span = tracing::info_span!("document", file = %path.display());

            match self
                .ingest_file(path, options, current, total)
                .instrument(span)
                .await
            {
                Ok(FileOutcome::Stored { chunks, bytes }) => {
                    stats.documents_processed += 1;
                    stats.chunks_stored += chunks;
                    stats.bytes_processed += bytes;
                }
                Ok(FileOutcome::Skipped) => stats.documents_skipped += 1,
                Err(e) => {
                    tracing::warn!("Failed to ingest {}: {}", path.display(), e);
                    stats.documents_failed += 1;
                }
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            processed = stats.documents_processed,
            skipped = stats.documents_skipped,
            failed = stats.documents_failed,
            chunks = stats.chunks_stored,
            "Ingested {} files in {:.2}s",
            total,
            stats.duration_secs
        );

        Ok(stats)
    }

    async fn ingest_file(
        &mut self,
        path: &Path,
        options: &IngestOptions,
        current: u64,
        total: u64,
    ) -> AppResult<FileOutcome> {
        let filename = display_name(path);
        let content_type = ContentType::from_path(path).ok_or_else(|| {
            AppError::Extraction(format!("Unsupported file type: {}", path.display()))
        })?;

        let size = parser::check_size(path)?;
        let bytes = fs::read(path)?;
        let content_hash = format!("{:x}", Sha256::digest(&bytes));

        if let Some(existing) = self.index.find_by_hash(&content_hash)? {
            if existing.status == DocumentStatus::Completed && !options.force {
                tracing::info!(
                    "Skipping {} (already ingested as {})",
                    filename,
                    existing.id
                );
                return Ok(FileOutcome::Skipped);
            }
            tracing::debug!("Replacing earlier copy {}", existing.id);
            self.index.delete_document(&existing.id)?;
        }

        let strategy_name = options.strategy.as_deref().or(self.config.strategy.as_deref());
        let strategy = get_chunking_strategy(Some(content_type), strategy_name);

        let document = DocumentRecord {
            id: Uuid::new_v4().to_string(),
            filename: filename.clone(),
            file_type: content_type,
            path: path.display().to_string(),
            content_hash,
            size_bytes: size,
            status: DocumentStatus::Processing,
            error_message: None,
            chunk_count: 0,
            strategy: Some(strategy.name.to_string()),
            created_at: Utc::now(),
            processed_at: None,
        };
        self.index.insert_document(&document)?;

        let base = self.config.chunking.apply_to(&strategy.options);
        let chunking = resolve_options(&base, &options.overrides);

        let result = self
            .process(&document, bytes, &chunking, current, total)
            .await;

        match result {
            Ok(chunks) => {
                self.index.mark_completed(&document.id, chunks)?;
                tracing::info!("Stored {} chunks for {}", chunks, filename);
                Ok(FileOutcome::Stored {
                    chunks,
                    bytes: size,
                })
            }
            Err(e) => {
                self.index.mark_failed(&document.id, &e.to_string())?;
                Err(e)
            }
        }
    }

    /// Steps that mark the document failed when they error.
    async fn process(
        &mut self,
        document: &DocumentRecord,
        bytes: Vec<u8>,
        options: &chunk::ChunkingOptions,
        current: u64,
        total: u64,
    ) -> AppResult<u32> {
        let path = PathBuf::from(&document.path);
        self.reporter.extract(current, total, &document.filename);
        let extracted = parser::extract_bytes(bytes, document.file_type, &path)?;

        let raw_chunks = match document.file_type {
            ContentType::Pdf => {
                chunk::chunk_pdf_text(&extracted.text, &extracted.page_breaks, options)
            }
            ContentType::PlainText | ContentType::Markdown => {
                chunk::chunk_text(&extracted.text, options)
            }
        };
        let chunks = clean_chunks(raw_chunks);
        self.reporter
            .chunk(current, total, &document.filename, chunks.len());

        if chunks.is_empty() {
            return Err(AppError::Extraction(format!(
                "{} contains no text",
                document.filename
            )));
        }

        let embedded = self.embed(&document.id, chunks).await?;
        if embedded.is_empty() {
            return Err(AppError::Knowledge(
                "No chunk could be embedded".to_string(),
            ));
        }

        self.reporter.store(current, total, &document.filename);
        self.index.upsert_chunks(&embedded)?;
        Ok(embedded.len() as u32)
    }

    /// Embed in batches; a failed batch is retried one chunk at a time and
    /// chunks that still fail are skipped.
    async fn embed(&self, document_id: &str, chunks: Vec<Chunk>) -> AppResult<Vec<KnowledgeChunk>> {
        let batch_size = EmbeddingConfig::from_base(self.config).batch_size.max(1);
        let total = chunks.len() as u64;
        let model = self.embeddings.model_name().to_string();
        let mut stored = Vec::with_capacity(chunks.len());
        let mut done = 0u64;

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

            let vectors: Vec<Option<Vec<f32>>> = match self.embeddings.embed_batch(&texts).await {
                Ok(vectors) if vectors.len() == texts.len() => {
                    vectors.into_iter().map(Some).collect()
                }
                Ok(vectors) => {
                    tracing::warn!(
                        "Provider returned {} embeddings for {} texts, retrying individually",
                        vectors.len(),
                        texts.len()
                    );
                    self.embed_individually(&texts).await
                }
                Err(e) => {
                    tracing::warn!("Batch embedding failed, retrying individually: {}", e);
                    self.embed_individually(&texts).await
                }
            };

            for (chunk, vector) in batch.iter().zip(vectors) {
                let Some(vector) = vector else { continue };
                stored.push(KnowledgeChunk {
                    id: Uuid::new_v4().to_string(),
                    document_id: document_id.to_string(),
                    position: stored.len() as u32,
                    text: chunk.text.clone(),
                    embedding: Some(vector),
                    metadata: chunk.metadata.clone(),
                });
            }

            done += batch.len() as u64;
            self.reporter.embed(done, total, &model);
        }

        Ok(stored)
    }

    async fn embed_individually(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            match self.embeddings.embed(text).await {
                Ok(vector) => vectors.push(Some(vector)),
                Err(e) => {
                    tracing::warn!("Skipping chunk {} of batch: {}", i, e);
                    vectors.push(None);
                }
            }
        }
        vectors
    }
}

/// Strip control characters from chunk texts and drop chunks left empty.
pub fn clean_chunks(chunks: Vec<Chunk>) -> Vec<Chunk> {
    chunks
        .into_iter()
        .filter_map(|mut chunk| {
            chunk.text = parser::clean_text(&chunk.text);
            (!chunk.text.is_empty()).then_some(chunk)
        })
        .collect()
}

/// Expand files and directories into supported files.
///
/// Directories are walked recursively and filtered by extension; files named
/// explicitly are kept so unsupported ones are reported as failures.
pub fn discover_files(paths: &[PathBuf], reporter: &ProgressReporter) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(AppError::Knowledge(format!(
                "Path not found: {}",
                path.display()
            )));
        }

        if path.is_file() {
            files.push(path.clone());
            reporter.discover(files.len() as u64, &path.display().to_string());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| ContentType::is_supported(p))
            .collect();
        found.sort();
        files.extend(found);
        reporter.discover(files.len() as u64, &path.display().to_string());
    }

    files.dedup();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
