//! # Mind Mate CLI
//!
//! Terminal front end for the Mind Mate travel assistant. Documents given on
//! the command line are loaded into an in-memory index for the session, and
//! questions are answered from them.
//!
//! ## Commands
//!
//! - `mindmate ask <QUESTION> --doc <PATH>...` - Answer one question
//! - `mindmate chat --doc <PATH>...` - Interactive conversation
//! - `mindmate ingest <PATH>...` - Load and chunk files, report the results
//!
//! ## Examples
//!
//! ```bash
//! mindmate ask "Which beach is quietest?" --doc guides/goa.md
//! mindmate --format json chat --doc guides/kerala.md --doc bookings.txt
//! RUST_LOG=mindmate_rag=debug mindmate ingest notes.txt itinerary.md
//! ```

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;

use config::FileConfig;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "mindmate")]
#[command(about = "Ask questions about your travel documents")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Override the number of documents retrieved per question
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Override the chunk size in characters
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Override the chunk overlap in characters
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question from the given documents
    Ask {
        /// The question to ask
        question: String,

        /// Document to load before answering (repeatable)
        #[arg(short, long = "doc")]
        docs: Vec<PathBuf>,
    },

    /// Start an interactive conversation
    Chat {
        /// Document to load before the conversation starts (repeatable)
        #[arg(short, long = "doc")]
        docs: Vec<PathBuf>,
    },

    /// Load and index files without asking anything
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Cli {
    fn file_config(&self) -> Result<FileConfig> {
        let mut config = FileConfig::load(self.config.as_deref())?;
        if let Some(top_k) = self.top_k {
            config.rag.top_k = top_k;
        }
        if let Some(size) = self.chunk_size {
            config.rag.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.rag.chunk_overlap = overlap;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: u8, format: LogFormat) -> Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("Failed to set tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format)?;

    let config = cli.file_config()?;
    match cli.command {
        Commands::Ask { question, docs } => commands::ask(&config, &docs, &question, cli.format).await,
        Commands::Chat { docs } => commands::chat(&config, &docs, cli.format).await,
        Commands::Ingest { paths } => commands::ingest(&config, &paths, cli.format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::parse_from([
            "mindmate", "--top-k", "7", "--chunk-size", "300", "ingest", "notes.txt",
        ]);
        let config = cli.file_config().unwrap();
        assert_eq!(config.rag.top_k, 7);
        assert_eq!(config.rag.chunk_size, 300);
        assert_eq!(config.rag.chunk_overlap, 200);
    }

    #[test]
    fn docs_are_repeatable() {
        let cli = Cli::parse_from(["mindmate", "ask", "where?", "--doc", "a.md", "-d", "b.txt"]);
        match cli.command {
            Commands::Ask { docs, .. } => assert_eq!(docs.len(), 2),
            _ => panic!("expected ask"),
        }
    }
}
