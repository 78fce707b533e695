//! Chunk command handler.
//!
//! Runs extraction and chunking on one file and prints the result, nothing
//! is stored.

use super::{print_json, ChunkingArgs};
use clap::Args;
use docqa_core::AppResult;
use docqa_knowledge::rag::locator;
use std::path::PathBuf;

/// Extract and chunk a file without storing it
#[derive(Args, Debug)]
pub struct ChunkCommand {
    /// File to chunk (.pdf, .txt, .md)
    pub file: PathBuf,

    /// Chunking strategy (see `docqa strategies`)
    #[arg(short, long)]
    pub strategy: Option<String>,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunkCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Chunking {}", self.file.display());

        let preview = docqa_knowledge::chunk_file(
            &self.file,
            self.strategy.as_deref(),
            &self.chunking.overrides(),
        )?;

        if self.json {
            return print_json(&preview);
        }

        let options = &preview.options;
        println!("File: {} ({})", preview.path, preview.content_type);
        println!(
            "Strategy: {} (max {}, min {}, overlap {})",
            preview.strategy, options.max_chunk_size, options.min_chunk_size, options.overlap_size
        );
        println!("Pages: {}", preview.page_count);
        println!("Chunks: {}", preview.chunks.len());

        for chunk in &preview.chunks {
            let meta = &chunk.metadata;
            println!();
            println!(
                "--- {}/{} [{}] chars {}..{} ({} words)",
                meta.chunk_index + 1,
                meta.total_chunks,
                locator(meta),
                meta.start_position,
                meta.end_position,
                meta.word_count
            );
            println!("{}", chunk.text);
        }

        Ok(())
    }
}
