//! Clean command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Remove every document from a knowledge base
#[derive(Args, Debug)]
pub struct CleanCommand {
    /// Knowledge base name
    pub base: String,
}

impl CleanCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        docqa_knowledge::clean(&config.workspace, &self.base)?;
        println!("Knowledge base '{}' cleaned", self.base);
        Ok(())
    }
}
