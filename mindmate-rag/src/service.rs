//! Chat service orchestrator.
//!
//! [`ChatService`] ties the pipeline together for one conversation:
//! upload (load → chunk → index) and chat (retrieve → rank → respond), with
//! every stage timed by the [`MetricsTracker`].
//!
//! When retrieval fails or finds nothing, the service still answers: it
//! returns [`fallback_guidance`] with a fixed confidence taken from
//! [`RagConfig`]. Only caller mistakes and responder failures surface as
//! errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use mindmate_rag::{ChatService, HashingEmbedder, InMemoryVectorIndex, RagConfig};
//!
//! let index = Arc::new(InMemoryVectorIndex::new(Arc::new(HashingEmbedder::default())));
//! let mut service = ChatService::builder().config(RagConfig::default()).index(index).build()?;
//!
//! service.upload_document(Path::new("goa.md")).await?;
//! let reply = service.chat("Which beach is quietest?").await?;
//! println!("{} ({}%)", reply.response, reply.confidence);
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::context::ContextManager;
use crate::document::{Metadata, RankedResult};
use crate::error::{RagError, Result};
use crate::loader::DocumentLoader;
use crate::metrics::{MetricsSummary, MetricsTracker, PerformanceMetrics};
use crate::respond::{Responder, TemplateResponder, fallback_guidance, preview};
use crate::retriever::{Retriever, confidence};
use crate::vectorstore::VectorIndex;

const TOTAL_TIMER: &str = "total_response";
const QUERY_TIMER: &str = "query_processing";
const RETRIEVAL_TIMER: &str = "document_retrieval";
const GENERATION_TIMER: &str = "response_generation";
const UPLOAD_TIMER: &str = "document_processing";

/// Outcome of ingesting one file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadReport {
    pub filename: String,
    pub status: String,
    pub chunks_created: usize,
    /// Seconds spent loading, chunking and indexing.
    pub processing_time: f64,
}

/// A retrieved document as shown to the user.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentPreview {
    pub id: String,
    /// Content cut to the configured preview length.
    pub content: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Answer to one chat message.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatReply {
    pub query: String,
    pub response: String,
    /// 0 to 100.
    pub confidence: f32,
    pub documents_retrieved: usize,
    /// Seconds from receipt to answer.
    pub response_time: f64,
    pub retrieved_documents: Vec<DocumentPreview>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentsReport {
    pub document_count: usize,
    pub status: String,
}

/// Why the service answered without documents.
#[derive(Debug, Clone, Copy)]
enum Fallback {
    Empty,
    IndexFailure,
}

/// Question answering over an indexed document collection.
///
/// The service is the single writer of its conversation context and metrics
/// history, so mutating operations take `&mut self`. Construct one via
/// [`ChatService::builder()`].
pub struct ChatService {
    config: RagConfig,
    loader: DocumentLoader,
    chunker: Arc<dyn Chunker>,
    retriever: Retriever,
    responder: Arc<dyn Responder>,
    context: ContextManager,
    metrics: MetricsTracker,
}

impl ChatService {
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        self.retriever.index()
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// Load, chunk and index the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file type is unsupported, the file cannot be read, or the
    /// index rejects the chunks.
    pub async fn upload_document(&mut self, path: &Path) -> Result<UploadReport> {
        self.metrics.start_timer(UPLOAD_TIMER);

        let result = async {
            let chunks = self.loader.load_and_chunk(path, self.chunker.as_ref()).await?;
            self.retriever.index().add(&chunks).await?;
            Ok::<_, RagError>(chunks.len())
        }
        .await;
        let processing_time = self.metrics.stop_timer(UPLOAD_TIMER);
        let chunks_created = result?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(filename = %filename, chunks_created, processing_time, "processed document");

        Ok(UploadReport { filename, status: "success".to_string(), chunks_created, processing_time })
    }

    /// Answer `message` from the indexed documents.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] for an empty message and propagates
    /// responder failures. Retrieval failures are answered with fallback
    /// guidance instead.
    pub async fn chat(&mut self, message: &str) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(RagError::InvalidInput("message is required".to_string()));
        }
        info!(query_len = message.len(), "received chat message");

        self.metrics.start_timer(TOTAL_TIMER);
        self.metrics.start_timer(QUERY_TIMER);
        self.context.set_current_query(message);
        self.context.add_user_message(message, None);
        let query_processing_time = self.metrics.stop_timer(QUERY_TIMER);

        self.metrics.start_timer(RETRIEVAL_TIMER);
        let retrieved = self.retriever.retrieve(message, self.config.top_k, None).await;
        let retrieval_time = self.metrics.stop_timer(RETRIEVAL_TIMER);

        let results = match retrieved {
            Ok(results) if results.is_empty() => {
                info!("no documents retrieved, using fallback guidance");
                return Ok(self.answer_without_documents(message, Fallback::Empty, retrieval_time));
            }
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "retrieval failed, using fallback guidance");
                return Ok(self.answer_without_documents(message, Fallback::IndexFailure, 0.0));
            }
        };

        self.metrics.start_timer(GENERATION_TIMER);
        self.context.add_retrieved_documents(&results);
        let window = self.context.window();
        let response = self.responder.respond(message, &results, &window).await?;
        let response_generation_time = self.metrics.stop_timer(GENERATION_TIMER);
        let total_response_time = self.metrics.stop_timer(TOTAL_TIMER);

        self.context.add_assistant_message(response.as_str(), None);

        self.metrics.record(PerformanceMetrics {
            timestamp: Utc::now(),
            query_processing_time,
            document_retrieval_time: retrieval_time,
            response_generation_time,
            total_response_time,
            documents_retrieved: results.len(),
            documents_used: results.len().min(self.config.context_documents),
            context_length: message.chars().count()
                + results.iter().map(|r| r.content.chars().count()).sum::<usize>(),
            query_length: message.chars().count(),
            response_length: response.chars().count(),
            similarity_scores: results.iter().map(|r| r.score).collect(),
        });

        let reply = ChatReply {
            query: message.to_string(),
            confidence: confidence(&results),
            documents_retrieved: results.len(),
            response_time: total_response_time,
            retrieved_documents: self.previews(&results),
            response,
        };
        info!(
            confidence = reply.confidence,
            documents_retrieved = reply.documents_retrieved,
            "answered chat message"
        );
        Ok(reply)
    }

    fn answer_without_documents(
        &mut self,
        message: &str,
        fallback: Fallback,
        retrieval_time: f64,
    ) -> ChatReply {
        let response = fallback_guidance(message);
        let total_response_time = self.metrics.stop_timer(TOTAL_TIMER);
        self.context.add_assistant_message(response.as_str(), None);

        self.metrics.record(PerformanceMetrics {
            timestamp: Utc::now(),
            query_processing_time: 0.0,
            document_retrieval_time: retrieval_time,
            response_generation_time: 0.0,
            total_response_time,
            documents_retrieved: 0,
            documents_used: 0,
            context_length: message.chars().count(),
            query_length: message.chars().count(),
            response_length: response.chars().count(),
            similarity_scores: Vec::new(),
        });

        let confidence = match fallback {
            Fallback::Empty => self.config.empty_result_confidence,
            Fallback::IndexFailure => self.config.index_failure_confidence,
        };
        ChatReply {
            query: message.to_string(),
            response,
            confidence,
            documents_retrieved: 0,
            response_time: total_response_time,
            retrieved_documents: Vec::new(),
        }
    }

    fn previews(&self, results: &[RankedResult]) -> Vec<DocumentPreview> {
        results
            .iter()
            .take(self.config.context_documents)
            .map(|r| DocumentPreview {
                id: r.id.clone(),
                content: preview(&r.content, self.config.preview_chars),
                score: r.score,
                metadata: r.metadata.clone(),
            })
            .collect()
    }

    pub fn metrics_summary(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    /// Number of chunks in the index.
    pub async fn document_count(&self) -> Result<DocumentsReport> {
        let document_count = self.retriever.index().count().await?;
        Ok(DocumentsReport { document_count, status: "success".to_string() })
    }

    /// Forget the conversation. Indexed documents and metrics are kept.
    pub fn reset_context(&mut self) {
        self.context.clear();
        info!("conversation context reset");
    }

    /// Write the metrics history to `path` as JSON.
    pub fn export_metrics(&self, path: &Path) -> Result<()> {
        self.metrics.export(path)
    }
}

/// Builder for constructing a [`ChatService`].
///
/// Only the index is required. The chunker defaults to a
/// [`RecursiveChunker`] sized from the config, and the responder to
/// [`TemplateResponder`].
#[derive(Default)]
pub struct ChatServiceBuilder {
    config: Option<RagConfig>,
    index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
    responder: Option<Arc<dyn Responder>>,
}

impl ChatServiceBuilder {
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the index is missing or the
    /// config fails [`RagConfig::validate`].
    pub fn build(self) -> Result<ChatService> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let index =
            self.index.ok_or_else(|| RagError::ConfigError("index is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let responder = self.responder.unwrap_or_else(|| Arc::new(TemplateResponder::new()));
        info!(collection = %config.collection, top_k = config.top_k, "chat service ready");

        Ok(ChatService {
            loader: DocumentLoader::new(),
            chunker,
            retriever: Retriever::new(index)
                .with_similarity_threshold(config.similarity_threshold),
            responder,
            context: ContextManager::new(config.history_limit, config.context_documents),
            metrics: MetricsTracker::new(),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbedder;
    use crate::inmemory::InMemoryVectorIndex;

    fn service() -> ChatService {
        let index = Arc::new(InMemoryVectorIndex::new(Arc::new(HashingEmbedder::default())));
        ChatService::builder().index(index).build().unwrap()
    }

    #[test]
    fn build_requires_index() {
        let err = ChatService::builder().build().err().unwrap();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let index = Arc::new(InMemoryVectorIndex::new(Arc::new(HashingEmbedder::default())));
        let config = RagConfig { top_k: 0, ..RagConfig::default() };
        assert!(ChatService::builder().config(config).index(index).build().is_err());
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let mut service = service();
        assert!(matches!(service.chat("   ").await, Err(RagError::InvalidInput(_))));
        assert!(service.metrics().history().is_empty());
    }

    #[tokio::test]
    async fn empty_index_answers_with_fallback() {
        let mut service = service();
        let reply = service.chat("hotel tips?").await.unwrap();
        assert_eq!(reply.confidence, 75.0);
        assert_eq!(reply.documents_retrieved, 0);
        assert!(reply.response.starts_with("For finding hotels"));
        assert_eq!(service.metrics().history().len(), 1);
        assert_eq!(service.context().history().len(), 2);
    }

    #[tokio::test]
    async fn upload_then_chat_uses_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goa.txt");
        std::fs::write(&path, "Palolem beach is calm and good for swimming.").unwrap();

        let mut service = service();
        let report = service.upload_document(&path).await.unwrap();
        assert_eq!(report.filename, "goa.txt");
        assert_eq!(report.status, "success");
        assert_eq!(report.chunks_created, 1);
        assert_eq!(service.document_count().await.unwrap().document_count, 1);

        let reply = service.chat("calm beach for swimming").await.unwrap();
        assert_eq!(reply.documents_retrieved, 1);
        assert!(reply.confidence > 0.0 && reply.confidence <= 100.0);
        assert!(reply.response.contains("Palolem"));
        assert_eq!(reply.retrieved_documents.len(), 1);
        assert_eq!(service.metrics_summary().total_queries_processed, 1);
    }

    #[tokio::test]
    async fn reset_keeps_metrics() {
        let mut service = service();
        service.chat("anything").await.unwrap();
        service.reset_context();
        assert!(service.context().history().is_empty());
        assert_eq!(service.metrics().history().len(), 1);
    }
}
