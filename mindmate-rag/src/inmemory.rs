//! In-memory vector index using cosine distance.
//!
//! This module provides [`InMemoryVectorIndex`], a vector index backed by a
//! `Vec` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, testing, and small knowledge bases.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::document::{DocumentChunk, Metadata};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::{MetadataFilter, QueryResult, VectorIndex};

#[derive(Debug, Clone)]
struct StoredChunk {
    id: String,
    content: String,
    metadata: Metadata,
    embedding: Vec<f32>,
}

/// An in-memory [`VectorIndex`].
///
/// Distances are cosine distances (`1 - cosine similarity`), so identical
/// directions have distance 0 and opposite directions distance 2. Chunks keep
/// insertion order, which breaks distance ties.
pub struct InMemoryVectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<StoredChunk>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index that embeds with the given provider.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, entries: RwLock::new(Vec::new()) }
    }

    fn backend_error(message: impl Into<String>) -> RagError {
        RagError::IndexError { backend: "InMemory".to_string(), message: message.into() }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn add(&self, chunks: &[DocumentChunk]) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Self::backend_error(format!(
                "provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let stored: Vec<StoredChunk> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredChunk {
                id: Uuid::new_v4().to_string(),
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                embedding,
            })
            .collect();
        let ids = stored.iter().map(|s| s.id.clone()).collect();

        let mut entries = self.entries.write().await;
        entries.extend(stored);
        debug!(added = chunks.len(), total = entries.len(), "added chunks to index");
        Ok(ids)
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<QueryResult> {
        if top_k == 0 {
            return Ok(QueryResult::default());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let entries = self.entries.read().await;
        let mut scored: Vec<(f32, &StoredChunk)> = entries
            .iter()
            .filter(|entry| filter.is_none_or(|f| f.matches(&entry.metadata)))
            .map(|entry| {
                let distance = 1.0 - self.embedder.similarity(&query_embedding, &entry.embedding);
                (distance, entry)
            })
            .collect();

        // Stable, so equal distances keep insertion order.
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(top_k);

        let mut result = QueryResult::default();
        for (distance, entry) in scored {
            result.ids.push(entry.id.clone());
            result.contents.push(entry.content.clone());
            result.metadatas.push(entry.metadata.clone());
            result.distances.push(distance);
        }

        debug!(top_k, hits = result.len(), "index query");
        Ok(result)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| !ids.contains(&entry.id));
        debug!(removed = before - entries.len(), "deleted chunks from index");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
