//! Source document extraction.
//!
//! Turns a file on disk into raw text plus, for PDFs, the character offsets
//! where pages end.

use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Largest file accepted for ingestion.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

const PAGE_SEPARATOR: char = '\x0C';

/// Supported document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "text/plain")]
    PlainText,
    #[serde(rename = "text/markdown")]
    Markdown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
            Self::Markdown => "text/markdown",
        }
    }

    /// Whether a path has a supported extension.
    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_some()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    /// Accepts MIME types and short names ("pdf", "text", "markdown").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application/pdf" | "pdf" => Ok(Self::Pdf),
            "text/plain" | "text" | "txt" | "plain" => Ok(Self::PlainText),
            "text/markdown" | "markdown" | "md" => Ok(Self::Markdown),
            other => Err(AppError::Extraction(format!(
                "Unsupported file type: {}",
                other
            ))),
        }
    }
}

/// Text extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,

    /// Character offsets where pages end, ascending (PDF only)
    pub page_breaks: Vec<usize>,

    pub content_type: ContentType,

    /// Number of pages (1 for unpaginated text)
    pub page_count: usize,
}

/// Extract text from a supported file.
pub fn extract(path: &Path) -> AppResult<ExtractedText> {
    let content_type = ContentType::from_path(path).ok_or_else(|| {
        AppError::Extraction(format!("Unsupported file type: {}", path.display()))
    })?;

    check_size(path)?;

    let bytes = fs::read(path)
        .map_err(|e| AppError::Extraction(format!("Failed to read {:?}: {}", path, e)))?;

    extract_bytes(bytes, content_type, path)
}

/// Extract text from file contents already in memory.
///
/// `path` is only used in messages.
pub fn extract_bytes(
    bytes: Vec<u8>,
    content_type: ContentType,
    path: &Path,
) -> AppResult<ExtractedText> {
    let extracted = match content_type {
        ContentType::Pdf => extract_pdf(&bytes)?,
        ContentType::PlainText | ContentType::Markdown => {
            let text = String::from_utf8(bytes).map_err(|_| {
                AppError::Extraction(format!("{} is not valid UTF-8", path.display()))
            })?;
            ExtractedText {
                text,
                page_breaks: Vec::new(),
                content_type,
                page_count: 1,
            }
        }
    };

    tracing::debug!(
        pages = extracted.page_count,
        "Extracted {} characters from {:?}",
        extracted.text.chars().count(),
        path
    );

    Ok(extracted)
}

/// Reject files over [`MAX_FILE_SIZE`].
pub fn check_size(path: &Path) -> AppResult<u64> {
    let size = fs::metadata(path)?.len();
    if size > MAX_FILE_SIZE {
        return Err(AppError::Extraction(format!(
            "{} is {} bytes, larger than the {} byte limit",
            path.display(),
            size,
            MAX_FILE_SIZE
        )));
    }
    Ok(size)
}

fn extract_pdf(bytes: &[u8]) -> AppResult<ExtractedText> {
    let raw = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("Failed to read PDF: {}", e)))?;

    let mut pages: Vec<&str> = raw.split(PAGE_SEPARATOR).map(str::trim).collect();
    // pdf-extract terminates the last page with a form feed
    while pages.len() > 1 && pages.last().is_some_and(|p| p.is_empty()) {
        pages.pop();
    }

    if pages.iter().all(|p| p.is_empty()) {
        return Err(AppError::Extraction(
            "PDF has no extractable text".to_string(),
        ));
    }

    let (text, page_breaks) = join_pages(&pages);
    Ok(ExtractedText {
        text,
        page_breaks,
        content_type: ContentType::Pdf,
        page_count: pages.len(),
    })
}

/// Join pages with a newline and record where each page but the last ends.
///
/// Each break is the cumulative character length of the preceding pages,
/// counting the joining newline.
pub fn join_pages(pages: &[&str]) -> (String, Vec<usize>) {
    let text = pages.join("\n");

    let mut breaks = Vec::with_capacity(pages.len().saturating_sub(1));
    let mut position = 0usize;
    for page in pages.iter().take(pages.len().saturating_sub(1)) {
        position += page.chars().count() + 1;
        breaks.push(position);
    }

    (text, breaks)
}

/// Strip NUL and control characters (tab, newline and carriage return are
/// kept) and trim.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            !matches!(c, '\x00'..='\x08' | '\x0B' | '\x0C' | '\x0E'..='\x1F' | '\x7F')
        })
        .collect::<String>()
        .trim()
        .to_string()
}
