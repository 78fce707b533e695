//! Documents command handler.

use super::print_json;
use clap::{Args, Subcommand};
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::DocumentRecord;

/// Inspect and remove ingested documents
#[derive(Args, Debug)]
pub struct DocumentsCommand {
    #[command(subcommand)]
    pub action: DocumentsAction,
}

#[derive(Subcommand, Debug)]
pub enum DocumentsAction {
    /// List every document in a base
    List {
        /// Knowledge base name
        base: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one document's processing status
    Status {
        /// Knowledge base name
        base: String,

        /// Document id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a document with its chunks and history
    Remove {
        /// Knowledge base name
        base: String,

        /// Document id
        id: String,
    },
}

impl DocumentsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let workspace = &config.workspace;

        match &self.action {
            DocumentsAction::List { base, json } => {
                let documents = docqa_knowledge::list_documents(workspace, base)?;
                if *json {
                    return print_json(&documents);
                }
                if documents.is_empty() {
                    println!("No documents in '{}'", base);
                }
                for document in &documents {
                    println!(
                        "{}  {:<10} {:>4} chunks  {}",
                        document.id,
                        document.status.as_str(),
                        document.chunk_count,
                        document.filename
                    );
                }
            }
            DocumentsAction::Status { base, id, json } => {
                let document = docqa_knowledge::document_status(workspace, base, id)?;
                if *json {
                    return print_json(&document);
                }
                print_document(&document);
            }
            DocumentsAction::Remove { base, id } => {
                docqa_knowledge::remove_document(workspace, base, id)?;
                println!("Removed document {} from '{}'", id, base);
            }
        }

        Ok(())
    }
}

fn print_document(document: &DocumentRecord) {
    println!("Document: {}", document.id);
    println!("  File: {} ({})", document.filename, document.file_type);
    println!("  Path: {}", document.path);
    println!("  Status: {}", document.status);
    if let Some(error) = &document.error_message {
        println!("  Error: {}", error);
    }
    println!("  Chunks: {}", document.chunk_count);
    println!("  Size: {} bytes", document.size_bytes);
    if let Some(strategy) = &document.strategy {
        println!("  Strategy: {}", strategy);
    }
    println!("  Created: {}", document.created_at);
    if let Some(processed) = document.processed_at {
        println!("  Processed: {}", processed);
    }
}
