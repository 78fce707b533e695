//! Ask command handler.
//!
//! Answers a question from a knowledge base with the configured LLM.

use super::print_json;
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::AskOptions;
use docqa_llm::create_client;

/// Ask a question against a knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Knowledge base name
    pub base: String,

    /// The question
    pub question: String,

    /// Only use this document (id from `docqa documents list`)
    #[arg(short, long)]
    pub document: Option<String>,

    /// Number of chunks to retrieve
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Temperature for the answer (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command for base '{}'", self.base);
        config.validate()?;

        let provider = config.provider.as_str();
        let endpoint = config.resolve_endpoint(provider);
        let api_key = config.resolve_api_key(provider);
        let client = create_client(provider, endpoint.as_deref(), api_key.as_deref())?;

        let options = AskOptions {
            base_name: self.base.clone(),
            question: self.question.clone(),
            document_id: self.document.clone(),
            limit: self.limit,
            temperature: self.temperature,
        };

        let response =
            docqa_knowledge::ask(&config.workspace, options, client.as_ref(), &config.model)
                .await?;

        tracing::debug!(
            "Answer ready: max_score={:.3}, low_confidence={}, sources={}",
            response.max_score,
            response.low_confidence,
            response.sources.len()
        );

        if self.json {
            return print_json(&response);
        }

        println!("Answer:");
        println!("{}", response.answer);
        println!();

        if response.sources.is_empty() {
            println!("Sources: (no sources available)");
        } else {
            println!("Sources:");
            for source in &response.sources {
                println!("- {} ({})", source.source, source.location);
                println!("  \"{}\"", source.snippet);
            }
        }

        Ok(())
    }
}
