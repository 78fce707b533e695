//! Structure-aware document chunking.
//!
//! The pipeline is pure and synchronous:
//! - normalize whitespace,
//! - detect headings and segment the text into sections,
//! - pack each section into size-bounded chunks with overlap,
//! - back-fill indices, totals and page numbers.
//!
//! Positions are character offsets into the normalized text.

mod headings;
mod metadata;
mod normalize;
mod options;
mod packer;
mod sections;
mod strategy;

pub use headings::{detect_headings, HeadingKind, HeadingMatch};
pub use metadata::find_page_number;
pub use normalize::{normalize, normalize_with_offsets};
pub use options::{ChunkingOptions, ChunkingOverrides};
pub use sections::Section;
pub use strategy::{
    available_strategies, find_strategy, get_chunking_strategy, resolve_options,
    validate_chunking_options, ChunkingStrategy, STRATEGIES,
};

use serde::{Deserialize, Serialize};

/// A piece of a document ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Where a chunk came from and how big it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Title of the enclosing section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// Level of the enclosing heading, when hierarchy is preserved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,

    /// Section name (same as the heading)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// 1-based page, for paginated sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    pub chunk_index: usize,
    pub total_chunks: usize,
    pub word_count: usize,
    pub char_count: usize,
    pub start_position: usize,
    pub end_position: usize,
}

/// Chunk plain or markdown text.
///
/// Never fails: empty input yields a single empty chunk.
pub fn chunk_text(text: &str, options: &ChunkingOptions) -> Vec<Chunk> {
    let normalized = normalize(text);
    chunk_normalized(&normalized, options)
}

/// Chunk text extracted from a paginated document.
///
/// `page_breaks` are character offsets into `text` where pages end; they
/// are remapped into normalized coordinates before pages are assigned.
pub fn chunk_pdf_text(text: &str, page_breaks: &[usize], options: &ChunkingOptions) -> Vec<Chunk> {
    let mut breaks = page_breaks.to_vec();
    breaks.sort_unstable();
    breaks.dedup();

    let (normalized, mapped) = normalize_with_offsets(text, &breaks);
    let mut chunks = chunk_normalized(&normalized, options);
    metadata::assign_pages(&mut chunks, &mapped);
    chunks
}

fn chunk_normalized(text: &str, options: &ChunkingOptions) -> Vec<Chunk> {
    let headings = if options.respect_heading_boundaries {
        detect_headings(text, options.max_heading_level)
    } else {
        Vec::new()
    };

    let sections = sections::segment(text, &headings, options);

    let mut chunks = Vec::new();
    for section in &sections {
        packer::pack_section(section, options, &mut chunks);
    }
    metadata::finalize(&mut chunks);

    tracing::debug!(
        headings = headings.len(),
        sections = sections.len(),
        chunks = chunks.len(),
        "Chunked {} characters",
        text.chars().count()
    );

    chunks
}
