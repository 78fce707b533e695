//! RAG response types.

use crate::chunk::ChunkMetadata;
use crate::types::KnowledgeChunk;
use serde::{Deserialize, Serialize};

/// Best similarity under this makes the prompt ask for caution.
pub const CONFIDENCE_THRESHOLD: f32 = 0.30;

/// Where an answer's evidence came from, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Document file name
    pub source: String,

    /// Human-readable location, e.g. "page 2 · Termination"
    pub location: String,

    /// Start of the chunk text
    pub snippet: String,
}

/// A retrieved chunk with its similarity to the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

impl RetrievedChunk {
    pub fn new(chunk: KnowledgeChunk, score: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            document_id: chunk.document_id,
            text: chunk.text,
            score,
            metadata: chunk.metadata,
        }
    }
}

/// Answer to a question plus the evidence behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub answer: String,

    /// Chunks used as context, best first
    pub matches: Vec<RetrievedChunk>,

    pub sources: Vec<RagSourceRef>,

    /// Highest similarity among the matches
    pub max_score: f32,

    pub low_confidence: bool,
}

impl RagResponse {
    pub fn new(answer: String, matches: Vec<RetrievedChunk>, sources: Vec<RagSourceRef>) -> Self {
        let max_score = matches
            .iter()
            .map(|m| m.score)
            .fold(0.0f32, f32::max);

        Self {
            answer,
            matches,
            sources,
            max_score,
            low_confidence: max_score < CONFIDENCE_THRESHOLD,
        }
    }

    /// Answer used when retrieval finds nothing; the LLM is not consulted.
    pub fn no_information(question: &str) -> Self {
        Self {
            answer: format!(
                "I could not find information about \"{}\" in the available documents.",
                question.trim()
            ),
            matches: Vec::new(),
            sources: Vec::new(),
            max_score: 0.0,
            low_confidence: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(score: f32) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: "c".to_string(),
            document_id: "d".to_string(),
            text: "Rent is due monthly.".to_string(),
            score,
            metadata: ChunkMetadata::default(),
        }
    }

    #[test]
    fn test_high_confidence() {
        let response = RagResponse::new("Monthly.".to_string(), vec![retrieved(0.2), retrieved(0.85)], Vec::new());
        assert_eq!(response.max_score, 0.85);
        assert!(!response.low_confidence);
    }

    #[test]
    fn test_low_confidence() {
        let response = RagResponse::new("Maybe.".to_string(), vec![retrieved(0.25)], Vec::new());
        assert!(response.low_confidence);
    }

    #[test]
    fn test_no_information() {
        let response = RagResponse::no_information(" pet policy ");
        assert!(response.answer.contains("\"pet policy\""));
        assert!(response.matches.is_empty());
        assert!(response.sources.is_empty());
        assert!(response.low_confidence);
    }
}
