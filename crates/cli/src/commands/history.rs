//! History command handler.

use super::print_json;
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Show previous questions and answers
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Knowledge base name
    pub base: String,

    /// Only questions asked about this document
    #[arg(short, long)]
    pub document: Option<String>,

    /// Number of entries, newest first
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let entries = docqa_knowledge::history(
            &config.workspace,
            &self.base,
            self.document.as_deref(),
            self.limit,
        )?;

        if self.json {
            return print_json(&entries);
        }

        if entries.is_empty() {
            println!("No history for '{}'", self.base);
        }
        for entry in &entries {
            println!("[{}] Q: {}", entry.created_at.format("%Y-%m-%d %H:%M"), entry.question);
            println!("A: {}", entry.answer);
            println!();
        }

        Ok(())
    }
}
