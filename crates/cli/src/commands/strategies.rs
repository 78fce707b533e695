//! Strategies command handler.

use super::print_json;
use clap::Args;
use docqa_core::AppResult;
use docqa_knowledge::chunk::available_strategies;
use docqa_knowledge::ContentType;

/// List chunking strategies
#[derive(Args, Debug)]
pub struct StrategiesCommand {
    /// Only strategies that accept this type (pdf, text, markdown or a MIME type)
    #[arg(long)]
    pub file_type: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StrategiesCommand {
    pub fn execute(&self) -> AppResult<()> {
        let content_type = self
            .file_type
            .as_deref()
            .map(str::parse::<ContentType>)
            .transpose()?;

        let strategies = available_strategies(content_type);

        if self.json {
            return print_json(&strategies);
        }

        for strategy in strategies {
            let options = &strategy.options;
            let types: Vec<&str> = strategy.file_types.iter().map(|t| t.mime()).collect();
            println!("{}", strategy.name);
            println!("  {}", strategy.description);
            println!(
                "  max {} / min {} / overlap {}, heading levels up to {}",
                options.max_chunk_size,
                options.min_chunk_size,
                options.overlap_size,
                options.max_heading_level
            );
            println!("  file types: {}", types.join(", "));
        }

        Ok(())
    }
}
