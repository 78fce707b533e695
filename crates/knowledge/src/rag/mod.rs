//! Retrieval-augmented answering over a knowledge base.

pub mod ask;
pub mod search;
pub mod types;

pub use ask::{build_context, locator, Answerer, DEFAULT_TEMPERATURE};
pub use search::{search, SearchFilters, DEFAULT_SEARCH_LIMIT};
pub use types::{RagResponse, RagSourceRef, RetrievedChunk, CONFIDENCE_THRESHOLD};
