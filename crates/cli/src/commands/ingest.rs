//! Ingest command handler.

use super::{print_json, ChunkingArgs};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::{IngestOptions, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Ingest files or directories into a knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Knowledge base name
    pub base: String,

    /// Files or directories (walked recursively)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Chunking strategy; chosen by file type when omitted
    #[arg(short, long)]
    pub strategy: Option<String>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    /// Re-ingest files that were already ingested
    #[arg(short, long)]
    pub force: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for base '{}'", self.base);

        let options = IngestOptions {
            base_name: self.base.clone(),
            paths: self.paths.clone(),
            strategy: self.strategy.clone(),
            overrides: self.chunking.overrides(),
            force: self.force,
        };

        // Progress lines share stderr with the logs.
        let reporter = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| {
                eprintln!("{}", event.format_simple())
            }))
        };

        let stats = docqa_knowledge::ingest(&config.workspace, options, &reporter).await?;

        if self.json {
            let output = serde_json::json!({
                "base": self.base,
                "documentsProcessed": stats.documents_processed,
                "documentsSkipped": stats.documents_skipped,
                "documentsFailed": stats.documents_failed,
                "chunksStored": stats.chunks_stored,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
            });
            return print_json(&output);
        }

        println!(
            "Ingested {} documents ({} chunks, {} bytes) in {:.2}s",
            stats.documents_processed,
            stats.chunks_stored,
            stats.bytes_processed,
            stats.duration_secs
        );
        if stats.documents_skipped > 0 {
            println!("Skipped {} unchanged documents (use --force to re-ingest)", stats.documents_skipped);
        }
        if stats.documents_failed > 0 {
            println!(
                "{} documents failed; see `docqa documents list {}`",
                stats.documents_failed, self.base
            );
        }

        Ok(())
    }
}
