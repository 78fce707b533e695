//! Stats command handler.

use super::print_json;
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Knowledge base name
    pub base: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for base '{}'", self.base);

        let stats = docqa_knowledge::stats(&config.workspace, &self.base)?;

        if self.json {
            let output = serde_json::json!({
                "base": stats.base_name,
                "documentsCount": stats.documents_count,
                "chunksCount": stats.chunks_count,
                "completedCount": stats.completed_count,
                "failedCount": stats.failed_count,
                "dbSizeBytes": stats.db_size_bytes,
                "lastProcessedAt": stats.last_processed_at,
            });
            return print_json(&output);
        }

        println!("Knowledge base: {}", stats.base_name);
        println!(
            "  Documents: {} ({} completed, {} failed)",
            stats.documents_count, stats.completed_count, stats.failed_count
        );
        println!("  Chunks: {}", stats.chunks_count);
        println!("  DB size: {} bytes", stats.db_size_bytes);
        if let Some(last) = stats.last_processed_at {
            println!("  Last processed: {}", last);
        }

        Ok(())
    }
}
