//! RAG answering orchestration.
//!
//! Retrieves relevant chunks and asks the LLM to answer from them.

use crate::chunk::ChunkMetadata;
use crate::embeddings::EmbeddingProvider;
use crate::index::SqliteIndex;
use crate::rag::search::{search, SearchFilters};
use crate::rag::types::{RagResponse, RagSourceRef, RetrievedChunk};
use crate::types::AskOptions;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, PromptDefinition};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Temperature used when neither the caller nor the prompt sets one.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Maximum snippet length for source references, in characters.
const MAX_SNIPPET_LENGTH: usize = 150;

/// Everything the answer step talks to.
pub struct Answerer<'a> {
    pub index: &'a SqliteIndex,
    pub embeddings: &'a dyn EmbeddingProvider,
    pub llm: &'a dyn LlmClient,
    pub model: &'a str,
    pub prompt: &'a PromptDefinition,
}

impl Answerer<'_> {
    /// Retrieve, prompt, answer and record.
    pub async fn ask(&self, options: &AskOptions, filters: &SearchFilters) -> AppResult<RagResponse> {
        if let Some(document_id) = &options.document_id {
            if self.index.get_document(document_id)?.is_none() {
                return Err(AppError::Knowledge(format!(
                    "Document '{}' not found",
                    document_id
                )));
            }
        }

        let results = search(self.index, self.embeddings, &options.question, filters).await?;
        if results.is_empty() {
            tracing::info!("No chunks retrieved, answering without the LLM");
            return Ok(RagResponse::no_information(&options.question));
        }

        let matches: Vec<RetrievedChunk> = results
            .into_iter()
            .map(|(chunk, score)| RetrievedChunk::new(chunk, score))
            .collect();
        let sources = self.map_chunks_to_sources(&matches)?;

        let mut response = RagResponse::new(String::new(), matches, sources);
        tracing::info!(
            "Retrieved {} chunks (max score: {:.3}, low_confidence: {})",
            response.matches.len(),
            response.max_score,
            response.low_confidence
        );

        let context = build_context(&response.matches);
        response.answer = self
            .generate_answer(options, &context, response.low_confidence)
            .await?;

        if let Some(document_id) = &options.document_id {
            self.index
                .record_history(Some(document_id), &options.question, &response.answer)?;
        }

        Ok(response)
    }

    async fn generate_answer(
        &self,
        options: &AskOptions,
        context: &str,
        low_confidence: bool,
    ) -> AppResult<String> {
        let variables: HashMap<String, Value> = HashMap::from([
            ("question".to_string(), json!(options.question)),
            ("context".to_string(), json!(context)),
            ("lowConfidence".to_string(), json!(low_confidence)),
        ]);
        let built = build_prompt(self.prompt, &variables)?;

        let behavior = &built.metadata.behavior;
        let temperature = options
            .temperature
            .or(behavior.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);

        let mut request = LlmRequest::new(built.user, self.model).with_temperature(temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = behavior.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            provider = self.llm.provider_name(),
            model = self.model,
            temperature,
            "Generating answer"
        );

        let response = self.llm.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }

    /// One reference per distinct (file, location), in match order.
    fn map_chunks_to_sources(&self, matches: &[RetrievedChunk]) -> AppResult<Vec<RagSourceRef>> {
        let mut filenames: HashMap<&str, String> = HashMap::new();
        let mut seen = HashSet::new();
        let mut sources = Vec::new();

        for retrieved in matches {
            let document_id = retrieved.document_id.as_str();
            if !filenames.contains_key(document_id) {
                let filename = self
                    .index
                    .get_document(document_id)?
                    .map(|d| d.filename)
                    .unwrap_or_else(|| document_id.to_string());
                filenames.insert(document_id, filename);
            }
            let source = filenames[document_id].clone();
            let location = locator(&retrieved.metadata);

            if seen.insert((source.clone(), location.clone())) {
                sources.push(RagSourceRef {
                    source,
                    location,
                    snippet: truncate_snippet(&retrieved.text, MAX_SNIPPET_LENGTH),
                });
            }
        }

        Ok(sources)
    }
}

/// "page 3 · Heading", "page 3", "Heading", or "chunk 4".
pub fn locator(metadata: &ChunkMetadata) -> String {
    match (metadata.page_number, metadata.heading.as_deref()) {
        (Some(page), Some(heading)) => format!("page {} · {}", page, heading),
        (Some(page), None) => format!("page {}", page),
        (None, Some(heading)) => heading.to_string(),
        (None, None) => format!("chunk {}", metadata.chunk_index + 1),
    }
}

/// Chunk texts separated by a blank line, each under its locator.
pub fn build_context(matches: &[RetrievedChunk]) -> String {
    matches
        .iter()
        .map(|m| format!("[{}]\n{}", locator(&m.metadata), m.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cut at a word boundary and collapse line breaks.
fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }

    let cut: String = flat.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(space) if space > 0 => format!("{}...", &cut[..space]),
        _ => format!("{}...", cut),
    }
}
