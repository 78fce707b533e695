//! docqa CLI
//!
//! Chunk documents, ingest them into local knowledge bases and ask questions
//! answered from their content.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ChunkCommand, CleanCommand, DocumentsCommand, HistoryCommand, IngestCommand,
    StatsCommand, StrategiesCommand,
};
use docqa_core::config::{AppConfig, STATE_DIR};
use docqa_core::logging::{self, LogFormat};
use std::path::PathBuf;
use tracing::Instrument;

/// Ask questions about your documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Question answering over local document collections", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOCQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract and chunk a file without storing it
    Chunk(ChunkCommand),

    /// List chunking strategies
    Strategies(StrategiesCommand),

    /// Ingest files or directories into a knowledge base
    Ingest(IngestCommand),

    /// Ask a question against a knowledge base
    Ask(AskCommand),

    /// Inspect and remove ingested documents
    Documents(DocumentsCommand),

    /// Show previous questions and answers
    History(HistoryCommand),

    /// Show knowledge base statistics
    Stats(StatsCommand),

    /// Remove every document from a knowledge base
    Clean(CleanCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Chunk(_) => "chunk",
            Self::Strategies(_) => "strategies",
            Self::Ingest(_) => "ingest",
            Self::Ask(_) => "ask",
            Self::Documents(_) => "documents",
            Self::History(_) => "history",
            Self::Stats(_) => "stats",
            Self::Clean(_) => "clean",
        }
    }
}

/// Environment and config file first, then CLI flags.
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load().context("Failed to load configuration")?;

    let config_path = cli.config.clone().or_else(|| {
        cli.workspace
            .as_ref()
            .map(|ws| ws.join(STATE_DIR).join("config.yaml"))
    });
    if let Some(path) = config_path.filter(|p| p.exists()) {
        config = config
            .merge_yaml(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    Ok(config.with_overrides(
        cli.workspace.clone(),
        cli.config.clone(),
        cli.provider.clone(),
        cli.model.clone(),
        cli.log_level.clone(),
        cli.log_format,
        cli.verbose,
        cli.no_color,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)
        .context("Failed to initialize logging")?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);

    config
        .ensure_state_dir()
        .with_context(|| format!("Failed to prepare {}", STATE_DIR))?;

    let command_name = cli.command.name();
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match &cli.command {
            Commands::Chunk(cmd) => cmd.execute(),
            Commands::Strategies(cmd) => cmd.execute(),
            Commands::Ingest(cmd) => cmd.execute(&config).await,
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Documents(cmd) => cmd.execute(&config),
            Commands::History(cmd) => cmd.execute(&config),
            Commands::Stats(cmd) => cmd.execute(&config),
            Commands::Clean(cmd) => cmd.execute(&config),
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(()) => tracing::debug!("Command completed"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("docqa {} failed", command_name))
}
