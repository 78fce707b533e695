//! Section segmentation.
//!
//! Three tiers, tried in order:
//! 1. split at detected headings,
//! 2. split at blank lines, promoting heading-like paragraphs,
//! 3. the whole text as a single section.

use super::headings::{classify_line, clean_heading, heading_level, HeadingMatch};
use super::ChunkingOptions;

/// Longest paragraph the paragraph tier will treat as a heading.
const HEADING_PARAGRAPH_MAX_CHARS: usize = 100;

/// Level given to heading-like paragraphs that match no rule.
const DEFAULT_PARAGRAPH_HEADING_LEVEL: u8 = 3;

/// A contiguous span of the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    /// Trimmed text of the span
    pub text: &'a str,

    pub heading: Option<String>,

    pub heading_level: Option<u8>,

    /// Character offset of `text` in the normalized document
    pub start_pos: usize,
}

impl<'a> Section<'a> {
    /// Build a section from an untrimmed slice starting at `start_pos`.
    /// Returns `None` when the slice is blank.
    fn from_span(
        span: &'a str,
        start_pos: usize,
        heading: Option<String>,
        heading_level: Option<u8>,
    ) -> Option<Self> {
        let text = span.trim();
        if text.is_empty() {
            return None;
        }
        let leading = &span[..span.len() - span.trim_start().len()];
        Some(Self {
            text,
            heading,
            heading_level,
            start_pos: start_pos + leading.chars().count(),
        })
    }
}

/// Split normalized text into sections.
pub fn segment<'a>(
    text: &'a str,
    headings: &[HeadingMatch],
    options: &ChunkingOptions,
) -> Vec<Section<'a>> {
    if options.respect_heading_boundaries {
        if !headings.is_empty() {
            return by_headings(text, headings);
        }

        let paragraphs = by_paragraphs(text, options.max_heading_level);
        if !paragraphs.is_empty() {
            return paragraphs;
        }
    }

    vec![whole(text)]
}

fn whole(text: &str) -> Section<'_> {
    Section::from_span(text, 0, None, None).unwrap_or(Section {
        text: "",
        heading: None,
        heading_level: None,
        start_pos: 0,
    })
}

fn by_headings<'a>(text: &'a str, headings: &[HeadingMatch]) -> Vec<Section<'a>> {
    let mut sections = Vec::with_capacity(headings.len() + 1);

    if let Some(first) = headings.first() {
        if let Some(lead) = Section::from_span(&text[..first.byte_index], 0, None, None) {
            sections.push(lead);
        }
    }

    for (i, heading) in headings.iter().enumerate() {
        let end = headings
            .get(i + 1)
            .map(|next| next.byte_index)
            .unwrap_or(text.len());
        let span = &text[heading.byte_index..end];

        let (title, level) = if heading.kind.is_structural() {
            (None, None)
        } else {
            (heading.title.clone(), Some(heading.level))
        };

        if let Some(section) = Section::from_span(span, heading.index, title, level) {
            sections.push(section);
        }
    }

    sections
}

fn by_paragraphs(text: &str, max_level: u8) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut char_start = 0usize;

    for part in text.split("\n\n") {
        if let Some(mut section) = Section::from_span(part, char_start, None, None) {
            if looks_like_heading(section.text) {
                let (title, level) = paragraph_heading(section.text, max_level);
                section.heading = Some(title);
                section.heading_level = Some(level);
            }
            sections.push(section);
        }

        char_start += part.chars().count() + 2;
    }

    sections
}

/// Short, capitalized and light on punctuation, or matching a heading rule.
fn looks_like_heading(paragraph: &str) -> bool {
    if paragraph.chars().count() >= HEADING_PARAGRAPH_MAX_CHARS || paragraph.contains('\n') {
        return false;
    }

    let capitalized = paragraph
        .chars()
        .next()
        .map(char::is_uppercase)
        .unwrap_or(false);
    let punctuated = paragraph.contains('.') || paragraph.contains(',');

    (capitalized && !punctuated) || classify_line(paragraph).is_some()
}

fn paragraph_heading(paragraph: &str, max_level: u8) -> (String, u8) {
    match classify_line(paragraph) {
        Some(kind) => (
            clean_heading(kind, paragraph).unwrap_or_else(|| paragraph.to_string()),
            heading_level(kind, paragraph, max_level),
        ),
        None => (
            paragraph.to_string(),
            DEFAULT_PARAGRAPH_HEADING_LEVEL.min(max_level.max(1)),
        ),
    }
}
