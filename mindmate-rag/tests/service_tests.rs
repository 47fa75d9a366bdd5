//! End-to-end tests for the chat service over real and failing indexes.

use std::sync::Arc;

use async_trait::async_trait;
use mindmate_rag::document::DocumentChunk;
use mindmate_rag::error::{RagError, Result};
use mindmate_rag::vectorstore::{MetadataFilter, QueryResult, VectorIndex};
use mindmate_rag::{ChatService, HashingEmbedder, InMemoryVectorIndex, PerformanceMetrics, RagConfig};

struct UnavailableIndex;

#[async_trait]
impl VectorIndex for UnavailableIndex {
    async fn add(&self, _chunks: &[DocumentChunk]) -> Result<Vec<String>> {
        Err(down())
    }

    async fn query(&self, _: &str, _: usize, _: Option<&MetadataFilter>) -> Result<QueryResult> {
        Err(down())
    }

    async fn count(&self) -> Result<usize> {
        Err(down())
    }

    async fn delete(&self, _ids: &[String]) -> Result<()> {
        Err(down())
    }

    async fn clear(&self) -> Result<()> {
        Err(down())
    }
}

fn down() -> RagError {
    RagError::IndexError { backend: "Unavailable".into(), message: "timed out".into() }
}

fn in_memory_service(config: RagConfig) -> ChatService {
    let index = Arc::new(InMemoryVectorIndex::new(Arc::new(HashingEmbedder::default())));
    ChatService::builder().config(config).index(index).build().unwrap()
}

#[tokio::test]
async fn index_failure_falls_back_with_eighty() {
    let mut service = ChatService::builder().index(Arc::new(UnavailableIndex)).build().unwrap();

    let reply = service.chat("book me a flight").await.unwrap();
    assert_eq!(reply.confidence, 80.0);
    assert_eq!(reply.documents_retrieved, 0);
    assert!(reply.retrieved_documents.is_empty());
    assert!(reply.response.starts_with("For flights"));

    let recorded = service.metrics().latest().unwrap();
    assert_eq!(recorded.documents_retrieved, 0);
    assert_eq!(recorded.query_length, "book me a flight".len());
}

#[tokio::test]
async fn empty_index_falls_back_with_seventy_five() {
    let mut service = in_memory_service(RagConfig::default());
    let reply = service.chat("what should I pack?").await.unwrap();
    assert_eq!(reply.confidence, 75.0);
    assert!(reply.response.starts_with("I don't have matching documents"));
}

#[tokio::test]
async fn fallback_confidences_are_configurable() {
    let config = RagConfig::builder().fallback_confidence(10.0, 20.0).build().unwrap();
    let mut service = in_memory_service(config.clone());
    assert_eq!(service.chat("anything").await.unwrap().confidence, 10.0);

    let mut broken =
        ChatService::builder().config(config).index(Arc::new(UnavailableIndex)).build().unwrap();
    assert_eq!(broken.chat("anything").await.unwrap().confidence, 20.0);
}

#[tokio::test]
async fn upload_failure_is_reported() {
    let mut service = ChatService::builder().index(Arc::new(UnavailableIndex)).build().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "some notes").unwrap();

    assert!(service.upload_document(&path).await.unwrap_err().is_index_failure());
    assert!(matches!(
        service.upload_document(&dir.path().join("guide.docx")).await,
        Err(RagError::UnsupportedFileType(_))
    ));
}

#[tokio::test]
async fn grounded_answer_with_previews_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kerala.md");
    std::fs::write(
        &path,
        "Kerala hotel houseboats drift along the quiet backwaters near Alleppey.\n\n\
         Munnar tea gardens sit high in the hills.\n\n\
         Kochi food markets sell fresh seafood.",
    )
    .unwrap();

    let config = RagConfig::builder().chunk_size(80).chunk_overlap(0).preview_chars(50).build().unwrap();
    let mut service = in_memory_service(config);
    let report = service.upload_document(&path).await.unwrap();
    assert_eq!(report.chunks_created, 3);

    let reply = service.chat("hotel houseboats on the backwaters").await.unwrap();
    assert_eq!(reply.documents_retrieved, 3);
    assert!(reply.retrieved_documents.len() <= 3);
    assert!(reply.response.starts_with("For accommodations"));

    let best = &reply.retrieved_documents[0];
    assert!(best.content.starts_with("Kerala hotel houseboats"));
    assert!(best.content.ends_with("..."));
    assert_eq!(best.content.chars().count(), 53);
    for pair in reply.retrieved_documents.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert_eq!(reply.confidence, (best.score * 100.0 * 100.0).round() / 100.0);

    let recorded: &PerformanceMetrics = service.metrics().latest().unwrap();
    assert_eq!(recorded.documents_retrieved, 3);
    assert_eq!(recorded.documents_used, 3);
    assert_eq!(recorded.similarity_scores.len(), 3);

    let window = service.context().window();
    assert_eq!(window.history.len(), 2);
    assert_eq!(window.documents.len(), 3);
}

#[tokio::test]
async fn metrics_export_round_trips_history() {
    let mut service = in_memory_service(RagConfig::default());
    service.chat("first").await.unwrap();
    service.chat("second").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("metrics.json");
    service.export_metrics(&out).unwrap();

    let exported: Vec<PerformanceMetrics> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported.len(), 2);
    assert_eq!(service.metrics_summary().total_queries_processed, 2);
}
