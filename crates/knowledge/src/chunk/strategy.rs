//! Named chunking presets and option validation.

use super::{ChunkingOptions, ChunkingOverrides};
use crate::parser::ContentType;
use serde::Serialize;

/// A named set of chunking options tuned for a kind of document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingStrategy {
    pub name: &'static str,
    pub description: &'static str,
    pub options: ChunkingOptions,
    pub file_types: &'static [ContentType],
}

const ALL_TYPES: &[ContentType] = &[
    ContentType::Pdf,
    ContentType::PlainText,
    ContentType::Markdown,
];
const PAPER_TYPES: &[ContentType] = &[ContentType::Pdf, ContentType::PlainText];

const fn preset(
    max_chunk_size: usize,
    min_chunk_size: usize,
    overlap_size: usize,
    max_heading_level: u8,
) -> ChunkingOptions {
    ChunkingOptions {
        max_chunk_size,
        min_chunk_size,
        overlap_size,
        respect_sentence_boundaries: true,
        respect_paragraph_boundaries: true,
        respect_heading_boundaries: true,
        preserve_heading_hierarchy: true,
        max_heading_level,
    }
}

/// Built-in strategies. The first entry is the default.
pub const STRATEGIES: &[ChunkingStrategy] = &[
    ChunkingStrategy {
        name: "default",
        description: "Balanced chunking for general documents",
        options: preset(1000, 200, 100, 6),
        file_types: ALL_TYPES,
    },
    ChunkingStrategy {
        name: "technical",
        description: "Smaller chunks for manuals and API documentation",
        options: preset(800, 150, 80, 8),
        file_types: ALL_TYPES,
    },
    ChunkingStrategy {
        name: "academic",
        description: "Larger chunks for papers with long arguments",
        options: preset(1200, 300, 150, 6),
        file_types: PAPER_TYPES,
    },
    ChunkingStrategy {
        name: "legal",
        description: "Large chunks that keep clauses together",
        options: preset(1500, 400, 200, 10),
        file_types: PAPER_TYPES,
    },
    ChunkingStrategy {
        name: "simple",
        description: "Fixed-size chunks without structure detection",
        options: ChunkingOptions {
            respect_paragraph_boundaries: false,
            respect_heading_boundaries: false,
            preserve_heading_hierarchy: false,
            ..preset(600, 100, 50, 3)
        },
        file_types: &[ContentType::PlainText],
    },
    ChunkingStrategy {
        name: "fine_grained",
        description: "Small chunks for precise retrieval",
        options: preset(500, 100, 50, 6),
        file_types: ALL_TYPES,
    },
];

impl ChunkingStrategy {
    pub fn supports(&self, content_type: ContentType) -> bool {
        self.file_types.contains(&content_type)
    }
}

/// Look a strategy up by name.
pub fn find_strategy(name: &str) -> Option<&'static ChunkingStrategy> {
    STRATEGIES.iter().find(|s| s.name == name)
}

fn default_strategy() -> &'static ChunkingStrategy {
    &STRATEGIES[0]
}

/// Pick a strategy for a document.
///
/// A known `name` wins when it supports the content type. Otherwise the
/// type decides: PDFs get `default`, plain text `simple`, markdown
/// `technical`.
pub fn get_chunking_strategy(
    content_type: Option<ContentType>,
    name: Option<&str>,
) -> &'static ChunkingStrategy {
    if let Some(strategy) = name.and_then(find_strategy) {
        if content_type.map_or(true, |t| strategy.supports(t)) {
            return strategy;
        }
        tracing::debug!(
            "Strategy '{}' does not support {:?}, selecting by type",
            strategy.name,
            content_type
        );
    }

    let fallback = match content_type {
        Some(ContentType::Pdf) | None => "default",
        Some(ContentType::PlainText) => "simple",
        Some(ContentType::Markdown) => "technical",
    };
    find_strategy(fallback).unwrap_or_else(default_strategy)
}

/// Strategies applicable to a content type, or all of them.
pub fn available_strategies(content_type: Option<ContentType>) -> Vec<&'static ChunkingStrategy> {
    STRATEGIES
        .iter()
        .filter(|s| content_type.map_or(true, |t| s.supports(t)))
        .collect()
}

/// Fill unset fields from the default strategy and clamp to safe ranges.
pub fn validate_chunking_options(overrides: &ChunkingOverrides) -> ChunkingOptions {
    resolve_options(&default_strategy().options, overrides)
}

/// Layer `overrides` on `base` and clamp the result.
pub fn resolve_options(base: &ChunkingOptions, overrides: &ChunkingOverrides) -> ChunkingOptions {
    clamp(overrides.apply_to(base))
}

fn clamp(options: ChunkingOptions) -> ChunkingOptions {
    ChunkingOptions {
        max_chunk_size: options.max_chunk_size.clamp(100, 2000),
        min_chunk_size: options.min_chunk_size.clamp(50, 500),
        overlap_size: options.overlap_size.min(300),
        max_heading_level: options.max_heading_level.clamp(1, 10),
        ..options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_presets() {
        let legal = find_strategy("legal").unwrap();
        assert_eq!(legal.options.max_chunk_size, 1500);
        assert_eq!(legal.options.overlap_size, 200);
        assert_eq!(legal.options.max_heading_level, 10);

        let simple = find_strategy("simple").unwrap();
        assert!(!simple.options.respect_heading_boundaries);
        assert!(!simple.options.respect_paragraph_boundaries);
        assert!(simple.options.respect_sentence_boundaries);
    }

    #[test]
    fn test_explicit_name_wins() {
        let strategy = get_chunking_strategy(Some(ContentType::Pdf), Some("legal"));
        assert_eq!(strategy.name, "legal");
        assert_eq!(get_chunking_strategy(None, Some("simple")).name, "simple");
    }

    #[test]
    fn test_unsupported_name_falls_back() {
        let strategy = get_chunking_strategy(Some(ContentType::Markdown), Some("legal"));
        assert_eq!(strategy.name, "technical");
    }

    #[test]
    fn test_fallback_by_type() {
        assert_eq!(get_chunking_strategy(Some(ContentType::Pdf), None).name, "default");
        assert_eq!(get_chunking_strategy(Some(ContentType::PlainText), None).name, "simple");
        assert_eq!(get_chunking_strategy(Some(ContentType::Markdown), None).name, "technical");
        assert_eq!(get_chunking_strategy(None, Some("nope")).name, "default");
    }

    #[test]
    fn test_available_strategies() {
        assert_eq!(available_strategies(None).len(), STRATEGIES.len());

        let markdown: Vec<&str> = available_strategies(Some(ContentType::Markdown))
            .iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(markdown, vec!["default", "technical", "fine_grained"]);

        let plain = available_strategies(Some(ContentType::PlainText));
        assert_eq!(plain.len(), STRATEGIES.len());
    }

    #[test]
    fn test_validate_clamps() {
        let options = validate_chunking_options(&ChunkingOverrides {
            max_chunk_size: Some(50_000),
            min_chunk_size: Some(1),
            overlap_size: Some(900),
            max_heading_level: Some(0),
            ..Default::default()
        });

        assert_eq!(options.max_chunk_size, 2000);
        assert_eq!(options.min_chunk_size, 50);
        assert_eq!(options.overlap_size, 300);
        assert_eq!(options.max_heading_level, 1);
    }

    #[test]
    fn test_validate_fills_defaults() {
        let options = validate_chunking_options(&ChunkingOverrides::default());
        assert_eq!(options, ChunkingOptions::default());
    }

    #[test]
    fn test_resolve_on_strategy_base() {
        let base = find_strategy("academic").unwrap().options;
        let options = resolve_options(
            &base,
            &ChunkingOverrides {
                overlap_size: Some(0),
                ..Default::default()
            },
        );
        assert_eq!(options.max_chunk_size, 1200);
        assert_eq!(options.overlap_size, 0);
    }
}
