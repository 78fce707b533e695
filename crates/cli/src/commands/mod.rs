//! Command handlers for the docqa CLI.
//!
//! One submodule per subcommand. Results go to stdout, logs to stderr.

pub mod ask;
pub mod chunk;
pub mod clean;
pub mod documents;
pub mod history;
pub mod ingest;
pub mod stats;
pub mod strategies;

pub use ask::AskCommand;
pub use chunk::ChunkCommand;
pub use clean::CleanCommand;
pub use documents::DocumentsCommand;
pub use history::HistoryCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;
pub use strategies::StrategiesCommand;

use clap::Args;
use docqa_core::AppResult;
use docqa_knowledge::ChunkingOverrides;
use serde::Serialize;

/// Chunking flags shared by `chunk` and `ingest`.
#[derive(Args, Debug, Clone, Default)]
pub struct ChunkingArgs {
    /// Largest chunk, in characters
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Smallest chunk, in characters
    #[arg(long)]
    pub min_chunk_size: Option<usize>,

    /// Characters carried over from the previous chunk
    #[arg(long)]
    pub overlap_size: Option<usize>,

    /// Deepest heading level recognized
    #[arg(long)]
    pub max_heading_level: Option<u8>,

    /// Cut overlap at any character instead of a sentence end
    #[arg(long)]
    pub no_sentence_boundaries: bool,

    /// Split long sections by size instead of by paragraph
    #[arg(long)]
    pub no_paragraph_boundaries: bool,

    /// Ignore headings when splitting
    #[arg(long)]
    pub no_heading_boundaries: bool,

    /// Do not record heading levels on chunks
    #[arg(long)]
    pub flat: bool,
}

impl ChunkingArgs {
    pub fn overrides(&self) -> ChunkingOverrides {
        let off = |flag: bool| flag.then_some(false);
        ChunkingOverrides {
            max_chunk_size: self.max_chunk_size,
            min_chunk_size: self.min_chunk_size,
            overlap_size: self.overlap_size,
            max_heading_level: self.max_heading_level,
            respect_sentence_boundaries: off(self.no_sentence_boundaries),
            respect_paragraph_boundaries: off(self.no_paragraph_boundaries),
            respect_heading_boundaries: off(self.no_heading_boundaries),
            preserve_heading_hierarchy: off(self.flat),
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
