//! Text and JSON rendering of service results.

use anyhow::Result;
use mindmate_rag::{ChatReply, DocumentsReport, MetricsSummary, UploadReport};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Something the CLI can print in either format.
pub trait Render: Serialize {
    fn render_text(&self) -> String;
}

/// Render `value` in the chosen format.
pub fn render<T: Render>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(value.render_text()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

pub fn print<T: Render>(value: &T, format: OutputFormat) -> Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

impl Render for UploadReport {
    fn render_text(&self) -> String {
        format!(
            "{}: {} ({} chunks in {:.2}s)",
            self.filename, self.status, self.chunks_created, self.processing_time
        )
    }
}

impl Render for ChatReply {
    fn render_text(&self) -> String {
        let mut out = format!(
            "{}\n\nconfidence: {:.2}%  documents: {}  time: {:.2}s",
            self.response, self.confidence, self.documents_retrieved, self.response_time
        );
        for (i, doc) in self.retrieved_documents.iter().enumerate() {
            let source = doc
                .metadata
                .get("file_name")
                .map(ToString::to_string)
                .unwrap_or_else(|| doc.id.clone());
            out.push_str(&format!("\n  [{}] {} (score {:.3})", i + 1, source, doc.score));
        }
        out
    }
}

impl Render for DocumentsReport {
    fn render_text(&self) -> String {
        format!("{} chunks indexed", self.document_count)
    }
}

impl Render for MetricsSummary {
    fn render_text(&self) -> String {
        let mut out = format!(
            "queries: {}\naverage response time: {:.4}s\naverage documents retrieved: {:.2}",
            self.total_queries_processed,
            self.average_response_time,
            self.average_documents_retrieved
        );
        if let Some(since) = self.tracking_since {
            out.push_str(&format!("\ntracking since: {}", since.to_rfc3339()));
        }
        out
    }
}
