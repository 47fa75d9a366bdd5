//! # mindmate-rag
//!
//! Retrieval-augmented question answering for the Mind Mate travel assistant.
//!
//! Documents are loaded from disk, split into overlapping chunks, embedded
//! and stored in a [`VectorIndex`]. Questions are answered from the chunks
//! nearest to them, ranked by relevance score, with a confidence estimate
//! and graceful fallback when nothing relevant is indexed.
//!
//! ## Components
//!
//! - [`DocumentLoader`] and [`Chunker`]: the ingestion boundary
//! - [`EmbeddingProvider`]: [`HashingEmbedder`] locally, `OpenAiEmbedder`
//!   with the `openai` feature
//! - [`VectorIndex`]: [`InMemoryVectorIndex`]
//! - [`Retriever`] and [`confidence`]: ranking and confidence estimation
//! - [`ContextManager`]: bounded conversation window
//! - [`MetricsTracker`]: per-stage timing and aggregate metrics
//! - [`ChatService`]: all of the above behind `upload_document` and `chat`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mindmate_rag::{ChatService, HashingEmbedder, InMemoryVectorIndex};
//!
//! #[tokio::main]
//! async fn main() -> mindmate_rag::Result<()> {
//!     let index = Arc::new(InMemoryVectorIndex::new(Arc::new(HashingEmbedder::default())));
//!     let mut service = ChatService::builder().index(index).build()?;
//!     service.upload_document("guides/goa.md".as_ref()).await?;
//!     let reply = service.chat("Where can I swim?").await?;
//!     println!("{}", reply.response);
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod inmemory;
pub mod loader;
pub mod metrics;
#[cfg(feature = "openai")]
pub mod openai;
pub mod respond;
pub mod retriever;
pub mod service;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use context::{ContextManager, ContextSummary, ContextWindow, ConversationTurn, Role};
pub use document::{
    Document, DocumentChunk, Metadata, MetadataValue, RankedResult, ResultSource,
    RetrievalCandidate,
};
pub use embedding::{EmbeddingProvider, cosine_similarity};
pub use error::{RagError, Result};
pub use hashing::HashingEmbedder;
pub use inmemory::InMemoryVectorIndex;
pub use loader::DocumentLoader;
pub use metrics::{MetricsSummary, MetricsTracker, PerformanceMetrics};
#[cfg(feature = "openai")]
pub use openai::OpenAiEmbedder;
pub use respond::{Responder, TemplateResponder, fallback_guidance};
pub use retriever::{Retriever, confidence, rank_candidates, score_from_distance};
pub use service::{
    ChatReply, ChatService, ChatServiceBuilder, DocumentPreview, DocumentsReport, UploadReport,
};
pub use vectorstore::{MetadataFilter, QueryResult, VectorIndex};
