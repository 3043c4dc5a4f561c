//! Jobmatch CLI - Semantic job search from the command line
//!
//! Matches pipe-separated job queries against a corpus of postings using
//! embeddings for similarity and zero-shot classification for criteria.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for a query interactively
//! jobmatch search
//!
//! # Search directly
//! jobmatch search "Developer|Boston|Full-Time"
//!
//! # Index the corpus into Qdrant
//! jobmatch --store qdrant index
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jobmatch_config::{
    ConfigOverrides, EmbeddingProviderType, FilterMode, LogFormat, StoreBackend,
};
use tracing_subscriber::EnvFilter;

mod commands;
mod progress;

/// Jobmatch - Semantic job search with zero-shot query understanding
#[derive(Parser, Debug)]
#[command(name = "jobmatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "JOBMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Vector store backend (memory, qdrant)
    #[arg(long, global = true, env = "JOBMATCH_STORE", value_parser = parse_store_backend)]
    store: Option<StoreBackend>,

    /// Qdrant server URL
    #[arg(long, global = true, env = "JOBMATCH_QDRANT_URL")]
    qdrant_url: Option<String>,

    /// Embedding provider type (huggingface, openai)
    #[arg(long, global = true, env = "JOBMATCH_EMBEDDING_PROVIDER", value_parser = parse_embedding_provider)]
    embedding_provider: Option<EmbeddingProviderType>,

    /// Job postings file (JSON array)
    #[arg(long, global = true, env = "JOBMATCH_CORPUS")]
    corpus: Option<PathBuf>,

    /// How extracted criteria affect search results
    #[arg(long, global = true, env = "JOBMATCH_FILTER_MODE", value_enum)]
    filter_mode: Option<FilterModeArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterModeArg {
    /// Report criteria without constraining results
    Diagnostic,
    /// Drop results that do not match every criterion
    PostFilter,
}

impl From<FilterModeArg> for FilterMode {
    fn from(arg: FilterModeArg) -> Self {
        match arg {
            FilterModeArg::Diagnostic => FilterMode::Diagnostic,
            FilterModeArg::PostFilter => FilterMode::PostFilter,
        }
    }
}

/// Parse store backend from string
fn parse_store_backend(s: &str) -> Result<StoreBackend, String> {
    s.parse()
        .map_err(|e: jobmatch_config::ConfigError| e.to_string())
}

/// Parse embedding provider from string
fn parse_embedding_provider(s: &str) -> Result<EmbeddingProviderType, String> {
    s.parse()
        .map_err(|e: jobmatch_config::ConfigError| e.to_string())
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            corpus_path: self.corpus.clone(),
            store_backend: self.store,
            qdrant_url: self.qdrant_url.clone(),
            embedding_provider: self.embedding_provider,
            filter_mode: self.filter_mode.map(FilterMode::from),
            log_level: self.flag_log_level().map(String::from),
        }
    }

    /// Log level implied by flags, if any
    fn flag_log_level(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else if self.verbose {
            Some("debug")
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search job postings (prompts for a query when none is given)
    Search(commands::search::SearchArgs),

    /// Index the job postings into the vector store
    Index(commands::index::IndexArgs),

    /// Show provider reachability and index status
    Status(commands::status::StatusArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str, format: &LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_ansi(true).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config path` and `config init` must work with a broken config file
    if let Commands::Config(cmd) = cli.command {
        let level = cli.global.flag_log_level().unwrap_or("warn");
        init_logging(level, &LogFormat::Text)?;
        return commands::config::execute(cmd, cli.global).await;
    }

    let config = commands::load_config(&cli.global)?;
    // --verbose/--quiet already landed in logging.level
    init_logging(&config.logging.level, &config.logging.format)?;

    // Execute the command
    match cli.command {
        Commands::Search(args) => commands::search::execute(args, cli.global, config).await,
        Commands::Index(args) => commands::index::execute(args, cli.global, config).await,
        Commands::Status(args) => commands::status::execute(args, cli.global, config).await,
        Commands::Config(_) => Ok(()),
    }
}
