//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use mindmate_rag::{ChatService, EmbeddingProvider, InMemoryVectorIndex, RagError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};

use crate::config::FileConfig;
use crate::output::{self, OutputFormat};

/// Build a service over a fresh in-memory index.
pub fn build_service(config: &FileConfig) -> Result<ChatService> {
    let embedder = config.embedding.build()?;
    info!(provider = embedder.name(), dimensions = embedder.dimensions(), "embedding provider ready");
    let index = Arc::new(InMemoryVectorIndex::new(embedder));
    ChatService::builder()
        .config(config.rag.clone())
        .index(index)
        .build()
        .context("Invalid configuration")
}

async fn upload_all(service: &mut ChatService, paths: &[PathBuf], format: OutputFormat) -> Result<()> {
    for path in paths {
        let report = service
            .upload_document(path)
            .await
            .with_context(|| format!("Failed to ingest {}", path.display()))?;
        output::print(&report, format)?;
    }
    Ok(())
}

pub async fn ask(config: &FileConfig, docs: &[PathBuf], question: &str, format: OutputFormat) -> Result<()> {
    let mut service = build_service(config)?;
    upload_all(&mut service, docs, format).await?;
    let reply = service.chat(question).await?;
    output::print(&reply, format)
}

pub async fn ingest(config: &FileConfig, paths: &[PathBuf], format: OutputFormat) -> Result<()> {
    let mut service = build_service(config)?;
    upload_all(&mut service, paths, format).await?;
    output::print(&service.document_count().await?, format)
}

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Upload(PathBuf),
    Export(PathBuf),
    Metrics,
    Documents,
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name, arg.is_empty()) {
            ("upload", false) => Self::Upload(PathBuf::from(arg)),
            ("export", false) => Self::Export(PathBuf::from(arg)),
            ("metrics", _) => Self::Metrics,
            ("documents", _) => Self::Documents,
            ("reset", _) => Self::Reset,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

const HELP: &str = "\
Type a question, or one of:
  /upload <path>   add a document
  /documents       show the number of indexed chunks
  /metrics         show performance metrics
  /export <path>   write the metrics history as JSON
  /reset           forget the conversation
  /quit            leave";

pub async fn chat(config: &FileConfig, docs: &[PathBuf], format: OutputFormat) -> Result<()> {
    let mut service = build_service(config)?;
    upload_all(&mut service, docs, format).await?;

    let mut editor = DefaultEditor::new()?;
    println!("Mind Mate travel assistant. /help for commands.");

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let command = ReplCommand::parse(&line);
        if command != ReplCommand::Empty {
            editor.add_history_entry(line.as_str())?;
        }
        if command == ReplCommand::Quit {
            break;
        }
        if let Err(e) = handle(&mut service, command, format).await {
            eprintln!("error: {e:#}");
        }
    }
    Ok(())
}

async fn handle(service: &mut ChatService, command: ReplCommand, format: OutputFormat) -> Result<()> {
    match command {
        ReplCommand::Ask(question) => output::print(&service.chat(&question).await?, format),
        ReplCommand::Upload(path) => upload_one(service, &path, format).await,
        ReplCommand::Export(path) => {
            service.export_metrics(&path)?;
            println!("metrics written to {}", path.display());
            Ok(())
        }
        ReplCommand::Metrics => output::print(&service.metrics_summary(), format),
        ReplCommand::Documents => output::print(&service.document_count().await?, format),
        ReplCommand::Reset => {
            service.reset_context();
            println!("conversation cleared");
            Ok(())
        }
        ReplCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ReplCommand::Unknown(line) => {
            println!("unknown command: {line} (try /help)");
            Ok(())
        }
        ReplCommand::Quit | ReplCommand::Empty => Ok(()),
    }
}

async fn upload_one(service: &mut ChatService, path: &Path, format: OutputFormat) -> Result<()> {
    match service.upload_document(path).await {
        Ok(report) => output::print(&report, format),
        Err(RagError::UnsupportedFileType(ext)) => {
            warn!(path = %path.display(), "unsupported file type");
            println!("cannot read {ext} files; try a text, markdown, csv or json file");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_questions() {
        assert_eq!(ReplCommand::parse("  best beaches? "), ReplCommand::Ask("best beaches?".into()));
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
    }

    #[test]
    fn slash_commands_parse() {
        assert_eq!(ReplCommand::parse("/upload guides/goa.md"), ReplCommand::Upload("guides/goa.md".into()));
        assert_eq!(ReplCommand::parse("/export  out.json"), ReplCommand::Export("out.json".into()));
        assert_eq!(ReplCommand::parse("/metrics"), ReplCommand::Metrics);
        assert_eq!(ReplCommand::parse("/documents"), ReplCommand::Documents);
        assert_eq!(ReplCommand::parse("/reset"), ReplCommand::Reset);
        assert_eq!(ReplCommand::parse("/exit"), ReplCommand::Quit);
    }

    #[test]
    fn missing_arguments_are_unknown() {
        assert_eq!(ReplCommand::parse("/upload"), ReplCommand::Unknown("/upload".into()));
        assert!(matches!(ReplCommand::parse("/fly"), ReplCommand::Unknown(_)));
    }

    #[tokio::test]
    async fn handle_uploads_and_answers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goa.txt");
        std::fs::write(&path, "Palolem beach is calm.").unwrap();

        let mut service = build_service(&FileConfig::default()).unwrap();
        handle(&mut service, ReplCommand::Upload(path), OutputFormat::Json).await.unwrap();
        assert_eq!(service.document_count().await.unwrap().document_count, 1);

        handle(&mut service, ReplCommand::Upload(dir.path().join("x.pdf")), OutputFormat::Text)
            .await
            .unwrap();
        handle(&mut service, ReplCommand::Ask("calm beach".into()), OutputFormat::Text).await.unwrap();
        assert_eq!(service.metrics().history().len(), 1);

        handle(&mut service, ReplCommand::Reset, OutputFormat::Text).await.unwrap();
        assert!(service.context().history().is_empty());
    }
}
