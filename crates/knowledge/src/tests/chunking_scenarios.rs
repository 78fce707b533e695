//! End-to-end chunking behaviour over realistic documents.

use crate::chunk::{
    chunk_pdf_text, chunk_text, find_page_number, find_strategy, normalize, Chunk,
    ChunkingOptions,
};
use crate::parser::join_pages;

/// A paragraph of eight short sentences, about 415 characters.
fn clause_paragraph(n: usize) -> String {
    (1..=8)
        .map(|j| format!("Clause {}{} asks the tenant to keep every room tidy.", n, j))
        .collect::<Vec<_>>()
        .join(" ")
}

fn slice_chars(text: &str, start: usize, len: usize) -> String {
    text.chars().skip(start).take(len).collect()
}

fn assert_dense(chunks: &[Chunk]) {
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata.chunk_index, i);
        assert_eq!(chunk.metadata.total_chunks, chunks.len());
    }
}

#[test]
fn test_single_heading_fits_one_chunk() {
    let chunks = chunk_text("# Title\nHello world. This is a test.", &ChunkingOptions::default());

    assert_eq!(chunks.len(), 1);
    let meta = &chunks[0].metadata;
    assert_eq!(meta.chunk_index, 0);
    assert_eq!(meta.total_chunks, 1);
    assert_eq!(meta.heading.as_deref(), Some("Title"));
    assert_eq!(meta.heading_level, Some(1));
    assert!(chunks[0].text.contains("Hello world. This is a test."));
}

#[test]
fn test_two_headings_two_chunks() {
    let body = "lorem ipsum dolor sit amet ".repeat(22);
    let body = body.trim_end();
    let text = format!("# A\n{}\n## B\n{}", body, body);

    let options = ChunkingOptions {
        max_chunk_size: 1000,
        ..Default::default()
    };
    let chunks = chunk_text(&text, &options);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].metadata.heading.as_deref(), Some("A"));
    assert_eq!(chunks[0].metadata.heading_level, Some(1));
    assert_eq!(chunks[1].metadata.heading.as_deref(), Some("B"));
    assert_eq!(chunks[1].metadata.heading_level, Some(2));
    assert_dense(&chunks);
}

#[test]
fn test_long_section_splits_with_overlap() {
    let paragraphs: Vec<String> = (1..=6).map(clause_paragraph).collect();
    let text = format!("# Policy\n\n{}", paragraphs.join("\n\n"));
    assert_eq!(normalize(&text), text);

    let options = ChunkingOptions {
        max_chunk_size: 1000,
        overlap_size: 100,
        ..Default::default()
    };
    let chunks = chunk_text(&text, &options);

    assert_eq!(chunks.len(), 3);
    assert_dense(&chunks);

    for chunk in &chunks {
        assert!(chunk.metadata.char_count <= 1000, "{}", chunk.metadata.char_count);
        assert_eq!(chunk.metadata.heading.as_deref(), Some("Policy"));
        assert_eq!(chunk.metadata.heading_level, Some(1));
    }

    for pair in chunks.windows(2) {
        let seed = pair[1].text.split("\n\n").next().unwrap();
        assert!(!seed.is_empty());
        assert!(
            pair[0].text.ends_with(seed),
            "{:?} is not a tail of the previous chunk",
            seed
        );
    }
}

#[test]
fn test_offsets_cover_the_text() {
    let paragraphs: Vec<String> = (1..=6).map(clause_paragraph).collect();
    let text = format!("# Policy\n\n{}", paragraphs.join("\n\n"));
    let total = text.chars().count();

    let options = ChunkingOptions {
        max_chunk_size: 1000,
        overlap_size: 100,
        ..Default::default()
    };
    let chunks = chunk_text(&text, &options);

    assert_eq!(chunks.first().unwrap().metadata.start_position, 0);
    assert_eq!(chunks.last().unwrap().metadata.end_position, total);

    for chunk in &chunks {
        let meta = &chunk.metadata;
        assert_eq!(meta.end_position - meta.start_position, meta.char_count);
        assert_eq!(slice_chars(&text, meta.start_position, meta.char_count), chunk.text);
    }

    for pair in chunks.windows(2) {
        assert!(pair[1].metadata.start_position >= pair[0].metadata.start_position);
        assert!(pair[1].metadata.start_position <= pair[0].metadata.end_position);
    }
}

#[test]
fn test_empty_input() {
    let chunks = chunk_text("", &ChunkingOptions::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "");
    assert_eq!(chunks[0].metadata.char_count, 0);
    assert_eq!(chunks[0].metadata.chunk_index, 0);
    assert_eq!(chunks[0].metadata.total_chunks, 1);
}

#[test]
fn test_page_lookup() {
    assert_eq!(find_page_number(700, &[500, 1200]), 2);
}

#[test]
fn test_pages_are_monotonic() {
    let pages: Vec<String> = (0..3)
        .map(|p| format!("{}\n\n{}", clause_paragraph(p * 2 + 1), clause_paragraph(p * 2 + 2)))
        .collect();
    let page_refs: Vec<&str> = pages.iter().map(String::as_str).collect();
    let (text, breaks) = join_pages(&page_refs);

    let chunks = chunk_pdf_text(&text, &breaks, &ChunkingOptions::default());
    assert!(chunks.len() > 1);

    let numbers: Vec<u32> = chunks
        .iter()
        .map(|c| c.metadata.page_number.unwrap())
        .collect();
    assert_eq!(numbers.first(), Some(&1));
    assert_eq!(numbers.last(), Some(&3));
    for pair in numbers.windows(2) {
        assert!(pair[0] <= pair[1], "pages went backwards: {:?}", numbers);
    }
}

#[test]
fn test_normalization_is_idempotent() {
    let samples = [
        "  Title\r\n\r\n\r\nSome   text\t here \n next line  ",
        "a\rb\r\n\n\n\nc",
        "",
        "already\n\nnormalized text",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn test_indices_dense_across_inputs() {
    let long = (1..=10).map(clause_paragraph).collect::<Vec<_>>().join("\n\n");
    let inputs = [
        "Just one line.".to_string(),
        "# One\n\nAlpha.\n\n## Two\n\nBravo.\n\n### Three\n\nCharlie.".to_string(),
        format!("INTRODUCTION AND SCOPE\n{}", long),
        long,
    ];

    for input in &inputs {
        let chunks = chunk_text(input, &ChunkingOptions::default());
        assert!(!chunks.is_empty());
        assert_dense(&chunks);
    }
}

#[test]
fn test_simple_strategy_ignores_structure() {
    let simple = find_strategy("simple").unwrap();
    let text = format!(
        "# Heading\n\n{}",
        (1..=4).map(clause_paragraph).collect::<Vec<_>>().join("\n\n")
    );

    let chunks = chunk_text(&text, &simple.options);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.metadata.char_count <= simple.options.max_chunk_size);
        assert!(chunk.metadata.heading.is_none());
        assert!(chunk.metadata.heading_level.is_none());
    }
    assert_dense(&chunks);
}

#[test]
fn test_multibyte_text_counts_chars() {
    let text = "# Café\n\nLe locataire règle le loyer à l'échéance.";
    let chunks = chunk_text(text, &ChunkingOptions::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata.heading.as_deref(), Some("Café"));
    assert_eq!(chunks[0].metadata.char_count, text.chars().count());
    assert_eq!(chunks[0].metadata.end_position, text.chars().count());
}
