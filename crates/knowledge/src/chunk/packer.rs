//! Packs sections into size-bounded chunks.
//!
//! Sections that fit are emitted whole. Longer sections are packed greedily
//! paragraph by paragraph, and each new chunk is seeded with an overlap
//! taken from the end of the previous one.

use super::sections::Section;
use super::{Chunk, ChunkMetadata, ChunkingOptions};
use text_splitter::{ChunkConfig, TextSplitter};

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SEPARATOR_LEN: usize = 2;

/// Sentence terminators recognized when trimming overlap.
const TERMINATORS: [char; 3] = ['.', '!', '?'];

struct Paragraph<'a> {
    text: &'a str,
    char_len: usize,
    /// Character offset just past the paragraph, within the section
    end: usize,
}

/// Append the chunks for one section to `out`.
pub fn pack_section(section: &Section<'_>, options: &ChunkingOptions, out: &mut Vec<Chunk>) {
    let section_len = section.text.chars().count();

    if section_len <= options.max_chunk_size {
        out.push(new_chunk(
            section,
            options,
            section.text.to_string(),
            section.start_pos,
            section_len,
        ));
        return;
    }

    if options.respect_paragraph_boundaries {
        pack_paragraphs(section, options, out);
    } else {
        split_unstructured(section, options, out);
    }
}

fn pack_paragraphs(section: &Section<'_>, options: &ChunkingOptions, out: &mut Vec<Chunk>) {
    let max = options.max_chunk_size;

    let mut buffer = String::new();
    let mut buffer_len = 0usize;
    let mut buffer_end = 0usize;

    for paragraph in paragraphs(section.text) {
        if buffer_len > 0 && buffer_len + SEPARATOR_LEN + paragraph.char_len > max {
            flush(section, options, &buffer, buffer_len, buffer_end, out);

            let window = options
                .overlap_size
                .min(max.saturating_sub(paragraph.char_len + SEPARATOR_LEN));
            let seed = overlap_seed(&buffer, buffer_len, window, options.respect_sentence_boundaries);

            let mut next = String::with_capacity(seed.len() + SEPARATOR_LEN + paragraph.text.len());
            let mut next_len = 0usize;
            if !seed.is_empty() {
                next.push_str(seed);
                next.push_str(PARAGRAPH_SEPARATOR);
                next_len = seed.chars().count() + SEPARATOR_LEN;
            }
            buffer = next;
            buffer_len = next_len;
        } else if buffer_len > 0 {
            buffer.push_str(PARAGRAPH_SEPARATOR);
            buffer_len += SEPARATOR_LEN;
        }

        buffer.push_str(paragraph.text);
        buffer_len += paragraph.char_len;
        buffer_end = paragraph.end;
    }

    if buffer_len > 0 {
        flush(section, options, &buffer, buffer_len, buffer_end, out);
    }
}

fn flush(
    section: &Section<'_>,
    options: &ChunkingOptions,
    buffer: &str,
    buffer_len: usize,
    buffer_end: usize,
    out: &mut Vec<Chunk>,
) {
    // Positions are anchored on the end of the last paragraph.
    let end = section.start_pos + buffer_end;
    let start = end.saturating_sub(buffer_len);
    out.push(new_chunk(section, options, buffer.to_string(), start, buffer_len));
}

/// Character-level splitting for sections packed without paragraph structure.
fn split_unstructured(section: &Section<'_>, options: &ChunkingOptions, out: &mut Vec<Chunk>) {
    let max = options.max_chunk_size.max(1);
    let overlap = options.overlap_size.min(max - 1);

    let config = ChunkConfig::new(max)
        .with_overlap(overlap)
        .unwrap_or_else(|_| ChunkConfig::new(max));
    let splitter = TextSplitter::new(config);

    let mut char_offset = 0usize;
    let mut byte_offset = 0usize;

    for (byte_index, piece) in splitter.chunk_indices(section.text) {
        if piece.trim().is_empty() {
            continue;
        }
        // chunk_indices yields ascending offsets, even with overlap
        char_offset += section.text[byte_offset..byte_index].chars().count();
        byte_offset = byte_index;

        let piece_len = piece.chars().count();
        out.push(new_chunk(
            section,
            options,
            piece.to_string(),
            section.start_pos + char_offset,
            piece_len,
        ));
    }
}

fn new_chunk(
    section: &Section<'_>,
    options: &ChunkingOptions,
    text: String,
    start: usize,
    char_count: usize,
) -> Chunk {
    let heading_level = if options.preserve_heading_hierarchy {
        section.heading_level
    } else {
        None
    };

    Chunk {
        metadata: ChunkMetadata {
            heading: section.heading.clone(),
            heading_level,
            section: section.heading.clone(),
            page_number: None,
            chunk_index: 0,
            total_chunks: 0,
            word_count: text.split_whitespace().count(),
            char_count,
            start_position: start,
            end_position: start + char_count,
        },
        text,
    }
}

/// Split a section body at blank lines, tracking character offsets.
fn paragraphs(text: &str) -> Vec<Paragraph<'_>> {
    let mut result = Vec::new();
    let mut offset = 0usize;

    for part in text.split(PARAGRAPH_SEPARATOR) {
        let part_len = part.chars().count();
        let trimmed = part.trim();
        if !trimmed.is_empty() {
            let trailing = part[part.trim_end().len()..].chars().count();
            result.push(Paragraph {
                text: trimmed,
                char_len: trimmed.chars().count(),
                end: offset + part_len - trailing,
            });
        }
        offset += part_len + SEPARATOR_LEN;
    }

    result
}

/// Overlap fragment carried from the end of `chunk` into the next chunk.
///
/// Looks at the last `window` characters and keeps the last complete
/// sentence found there, terminator included. Falls back to the raw slice
/// when no complete sentence is found or sentences are not respected.
pub fn overlap_seed(chunk: &str, chunk_len: usize, window: usize, respect_sentences: bool) -> &str {
    if window == 0 || chunk_len == 0 {
        return "";
    }
    if chunk_len <= window {
        return chunk.trim();
    }

    let tail_start = chunk
        .char_indices()
        .nth(chunk_len - window)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let tail = &chunk[tail_start..];

    if !respect_sentences {
        return tail.trim();
    }

    last_complete_sentence(chunk, tail_start).unwrap_or_else(|| tail.trim())
}

fn last_complete_sentence(chunk: &str, tail_start: usize) -> Option<&str> {
    let tail = &chunk[tail_start..];

    // Byte ranges of terminator runs within the tail.
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for (i, c) in tail.char_indices() {
        if TERMINATORS.contains(&c) {
            match runs.last_mut() {
                Some(run) if run.1 == i => run.1 = i + c.len_utf8(),
                _ => runs.push((i, i + c.len_utf8())),
            }
        }
    }

    let (last_start, last_end) = *runs.last()?;
    let sentence_start = match runs.len() {
        1 => {
            let preceded_by_terminator = chunk[..tail_start]
                .trim_end()
                .ends_with(TERMINATORS);
            if tail_start > 0 && !preceded_by_terminator {
                return None;
            }
            0
        }
        n => runs[n - 2].1,
    };

    let body = &tail[sentence_start..last_start];
    let body_trimmed = body.trim_start();
    if body_trimmed.trim().is_empty() {
        return None;
    }

    let from = sentence_start + (body.len() - body_trimmed.len());
    Some(&tail[from..last_end])
}
