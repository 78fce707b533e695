//! Chunking options and partial overrides.

use serde::{Deserialize, Serialize};

/// Knobs controlling how a document is segmented and packed into chunks.
///
/// The chunk engine trusts these values; user input goes through
/// [`crate::chunk::validate_chunking_options`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingOptions {
    /// Target upper bound on chunk length, in characters
    pub max_chunk_size: usize,

    /// Advisory lower bound, in characters (not enforced)
    pub min_chunk_size: usize,

    /// Characters carried from the end of one chunk into the next
    pub overlap_size: usize,

    /// Trim the overlap to the last complete sentence
    pub respect_sentence_boundaries: bool,

    /// Pack whole paragraphs when a section is too long
    pub respect_paragraph_boundaries: bool,

    /// Split the document at detected headings
    pub respect_heading_boundaries: bool,

    /// Record heading levels on chunks
    pub preserve_heading_hierarchy: bool,

    /// Deepest heading level recorded
    pub max_heading_level: u8,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            min_chunk_size: 200,
            overlap_size: 100,
            respect_sentence_boundaries: true,
            respect_paragraph_boundaries: true,
            respect_heading_boundaries: true,
            preserve_heading_hierarchy: true,
            max_heading_level: 6,
        }
    }
}

/// Partial options supplied by a caller; unset fields keep the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respect_sentence_boundaries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respect_paragraph_boundaries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respect_heading_boundaries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_heading_hierarchy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heading_level: Option<u8>,
}

impl ChunkingOverrides {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer these overrides on top of `base`. An explicit zero is honored.
    pub fn apply_to(&self, base: &ChunkingOptions) -> ChunkingOptions {
        ChunkingOptions {
            max_chunk_size: self.max_chunk_size.unwrap_or(base.max_chunk_size),
            min_chunk_size: self.min_chunk_size.unwrap_or(base.min_chunk_size),
            overlap_size: self.overlap_size.unwrap_or(base.overlap_size),
            respect_sentence_boundaries: self
                .respect_sentence_boundaries
                .unwrap_or(base.respect_sentence_boundaries),
            respect_paragraph_boundaries: self
                .respect_paragraph_boundaries
                .unwrap_or(base.respect_paragraph_boundaries),
            respect_heading_boundaries: self
                .respect_heading_boundaries
                .unwrap_or(base.respect_heading_boundaries),
            preserve_heading_hierarchy: self
                .preserve_heading_hierarchy
                .unwrap_or(base.preserve_heading_hierarchy),
            max_heading_level: self.max_heading_level.unwrap_or(base.max_heading_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let overrides = ChunkingOverrides {
            max_chunk_size: Some(400),
            respect_heading_boundaries: Some(false),
            ..Default::default()
        };
        let options = overrides.apply_to(&ChunkingOptions::default());

        assert_eq!(options.max_chunk_size, 400);
        assert_eq!(options.overlap_size, 100);
        assert!(!options.respect_heading_boundaries);
        assert!(options.respect_paragraph_boundaries);
    }

    #[test]
    fn test_zero_override_is_honored() {
        let overrides = ChunkingOverrides {
            overlap_size: Some(0),
            ..Default::default()
        };
        assert_eq!(overrides.apply_to(&ChunkingOptions::default()).overlap_size, 0);
    }

    #[test]
    fn test_overrides_from_yaml() {
        let overrides: ChunkingOverrides =
            serde_yaml::from_str("maxChunkSize: 700\nrespectSentenceBoundaries: false\n").unwrap();
        assert_eq!(overrides.max_chunk_size, Some(700));
        assert_eq!(overrides.respect_sentence_boundaries, Some(false));
        assert!(overrides.overlap_size.is_none());
        assert!(!overrides.is_empty());
        assert!(ChunkingOverrides::default().is_empty());
    }
}
