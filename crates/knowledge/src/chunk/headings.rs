//! Heading detection.
//!
//! A battery of line-anchored patterns is run over normalized text. When
//! two patterns match at the same position the earlier rule in
//! [`HEADING_RULES`] wins, so the table is ordered most specific first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Which rule recognized a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingKind {
    /// "Page 3" or "- 3 -"
    PageMarker,
    /// "1 Introduction ........ 4"
    TableOfContents,
    /// "## Scope"
    Markdown,
    /// "Article 5. Termination"
    Legal,
    /// "Abstract:", "References."
    Academic,
    /// "Overview:", "API Reference:"
    Technical,
    /// "IV. Results"
    Roman,
    /// "B. Payment Terms"
    Lettered,
    /// "2.1 Methods"
    Numbered,
    /// "TERMS AND CONDITIONS"
    AllCaps,
    /// "Payment schedule:"
    TitleCase,
}

impl HeadingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageMarker => "page_marker",
            Self::TableOfContents => "table_of_contents",
            Self::Markdown => "markdown",
            Self::Legal => "legal",
            Self::Academic => "academic",
            Self::Technical => "technical",
            Self::Roman => "roman",
            Self::Lettered => "lettered",
            Self::Numbered => "numbered",
            Self::AllCaps => "all_caps",
            Self::TitleCase => "title_case",
        }
    }

    /// Page markers and TOC lines split sections but carry no title.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::PageMarker | Self::TableOfContents)
    }
}

static HEADING_RULES: LazyLock<Vec<(HeadingKind, Regex)>> = LazyLock::new(|| {
    [
        (
            HeadingKind::PageMarker,
            r"(?m)^(?:Page[ \t]+\d+|-[ \t]*\d+[ \t]*-)$",
        ),
        (
            HeadingKind::TableOfContents,
            r"(?m)^\d+[ \t]+[A-Z].*?\.{3,}[ \t]*\d+$",
        ),
        (HeadingKind::Markdown, r"(?m)^#{1,6}[ \t]+\S.*$"),
        (
            HeadingKind::Legal,
            r"(?m)^(?:Article|Section|Chapter)[ \t]+\d+[.:].*$",
        ),
        (
            HeadingKind::Academic,
            r"(?m)^(?:Abstract|Introduction|Conclusion|References?|Bibliography)[.:]",
        ),
        (
            HeadingKind::Technical,
            r"(?m)^(?:Overview|Implementation|API[ \t]+Reference|Configuration)[.:]",
        ),
        (HeadingKind::Roman, r"(?m)^[IVX]+\.[ \t]+[A-Z].*$"),
        (HeadingKind::Lettered, r"(?m)^[A-Z]\.[ \t]+[A-Z].*$"),
        (HeadingKind::Numbered, r"(?m)^\d+(?:\.\d+)*\.?[ \t]+[A-Z].*$"),
        (HeadingKind::AllCaps, r"(?m)^[A-Z][A-Z ]{9,}$"),
        (HeadingKind::TitleCase, r"(?m)^[A-Z][a-z ]+:$"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("valid heading regex")))
    .collect()
});

static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s+").expect("valid number prefix regex"));

static ROMAN_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[IVX]+\.\s+").expect("valid roman prefix regex"));

static LETTER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\.\s+").expect("valid letter prefix regex"));

static LEGAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Article|Section|Chapter)\s+(\d+)[.:]\s*").expect("valid legal prefix regex")
});

/// A heading found in normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// The matched text, as it appears in the document
    pub raw: String,

    /// Cleaned title; `None` for structural markers
    pub title: Option<String>,

    /// Character offset of the match
    pub index: usize,

    /// Byte offset of the match
    pub byte_index: usize,

    /// Level, 1 being the outermost
    pub level: u8,

    pub kind: HeadingKind,
}

/// Find every heading in `text`, ordered by position.
pub fn detect_headings(text: &str, max_level: u8) -> Vec<HeadingMatch> {
    let mut found: Vec<(usize, usize, &str)> = Vec::new();
    for (rule, (_, regex)) in HEADING_RULES.iter().enumerate() {
        for m in regex.find_iter(text) {
            found.push((m.start(), rule, m.as_str()));
        }
    }

    // Position first, then rule order.
    found.sort_unstable_by_key(|&(start, rule, _)| (start, rule));
    found.dedup_by_key(|&mut (start, _, _)| start);

    let mut headings = Vec::with_capacity(found.len());
    let mut char_index = 0usize;
    let mut last_byte = 0usize;

    for (byte_index, rule, raw) in found {
        char_index += text[last_byte..byte_index].chars().count();
        last_byte = byte_index;

        let kind = HEADING_RULES[rule].0;
        headings.push(HeadingMatch {
            raw: raw.to_string(),
            title: clean_heading(kind, raw),
            index: char_index,
            byte_index,
            level: heading_level(kind, raw, max_level),
            kind,
        });
    }

    headings
}

/// The first rule matching a single line, if any.
pub fn classify_line(line: &str) -> Option<HeadingKind> {
    HEADING_RULES
        .iter()
        .find(|(_, regex)| regex.is_match(line))
        .map(|(kind, _)| *kind)
}

/// Heading level for a matched string, clamped to `1..=max_level`.
pub fn heading_level(kind: HeadingKind, raw: &str, max_level: u8) -> u8 {
    let level = match kind {
        HeadingKind::Markdown => raw.chars().take_while(|&c| c == '#').count() as u8,
        HeadingKind::Numbered => raw
            .split_whitespace()
            .next()
            .map(|number| {
                number
                    .split('.')
                    .filter(|segment| !segment.is_empty())
                    .count() as u8
            })
            .unwrap_or(1),
        HeadingKind::Roman => 1,
        HeadingKind::Lettered => 2,
        HeadingKind::Legal => {
            if raw.starts_with("Section") {
                2
            } else {
                1
            }
        }
        HeadingKind::Academic | HeadingKind::Technical | HeadingKind::AllCaps => 1,
        HeadingKind::TitleCase => 2,
        HeadingKind::PageMarker | HeadingKind::TableOfContents => 3,
    };

    level.clamp(1, max_level.max(1))
}

/// Strip numbering, markup and trailing punctuation from a heading.
pub fn clean_heading(kind: HeadingKind, raw: &str) -> Option<String> {
    let raw = raw.trim();
    let cleaned = match kind {
        HeadingKind::PageMarker | HeadingKind::TableOfContents => return None,
        HeadingKind::Markdown => raw.trim_start_matches('#').trim().to_string(),
        HeadingKind::Numbered => NUMBER_PREFIX.replace(raw, "").into_owned(),
        HeadingKind::Roman => ROMAN_PREFIX.replace(raw, "").into_owned(),
        HeadingKind::Lettered => LETTER_PREFIX.replace(raw, "").into_owned(),
        HeadingKind::Legal => match LEGAL_PREFIX.captures(raw) {
            Some(caps) => {
                let rest = raw[caps[0].len()..].trim();
                if rest.is_empty() {
                    format!("{} {}", &caps[1], &caps[2])
                } else {
                    rest.to_string()
                }
            }
            None => raw.to_string(),
        },
        HeadingKind::Academic | HeadingKind::Technical => {
            raw.trim_end_matches(['.', ':']).to_string()
        }
        HeadingKind::AllCaps | HeadingKind::TitleCase => raw.to_string(),
    };

    let cleaned = cleaned.trim().trim_end_matches(':').trim_end();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
