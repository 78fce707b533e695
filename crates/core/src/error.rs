//! Error types for docqa.
//!
//! A single error enum covers configuration, I/O, LLM, knowledge base,
//! extraction and prompt failures.

use thiserror::Error;

/// Unified error type for docqa.
///
/// Library functions return `Result<T, AppError>` and never panic on bad input.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base, storage and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Text extraction errors (unsupported or unreadable documents)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
