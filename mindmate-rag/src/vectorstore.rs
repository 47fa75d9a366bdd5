//! Vector index trait: persistence and nearest-neighbour search over chunks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{DocumentChunk, Metadata, MetadataValue, RetrievalCandidate};
use crate::error::Result;

/// A conjunction of `key == value` metadata predicates.
///
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataFilter {
    predicates: Metadata,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`.
    pub fn equals(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.predicates.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether the given metadata satisfies every predicate.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.predicates.iter().all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

impl From<Metadata> for MetadataFilter {
    fn from(predicates: Metadata) -> Self {
        Self { predicates }
    }
}

/// Raw nearest-neighbour output with position-aligned lists.
///
/// Backends fill `ids` fully; `contents`, `metadatas` and `distances` may be
/// shorter when a backend omits a field, and consumers must tolerate that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub contents: Vec<String>,
    pub metadatas: Vec<Metadata>,
    pub distances: Vec<f32>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Zip the aligned lists into candidates, filling gaps with empty
    /// content, empty metadata and a missing distance.
    pub fn into_candidates(self) -> Vec<RetrievalCandidate> {
        let mut contents = self.contents.into_iter();
        let mut metadatas = self.metadatas.into_iter();
        let mut distances = self.distances.into_iter();

        self.ids
            .into_iter()
            .map(|id| RetrievalCandidate {
                id,
                content: contents.next().unwrap_or_default(),
                metadata: metadatas.next().unwrap_or_default(),
                raw_distance: distances.next(),
            })
            .collect()
    }
}

/// A storage backend for chunk embeddings with text-driven similarity search.
///
/// The index owns embedding: callers hand it text and it embeds both stored
/// chunks and queries with the same provider.
///
/// # Example
///
/// ```rust,ignore
/// use mindmate_rag::{HashingEmbedder, InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new(Arc::new(HashingEmbedder::default()));
/// let ids = index.add(&chunks).await?;
/// let hits = index.query("beach hotels", 5, None).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Store chunks and return the ids assigned to them, in input order.
    async fn add(&self, chunks: &[DocumentChunk]) -> Result<Vec<String>>;

    /// Return up to `top_k` nearest chunks to `text`, ascending by distance,
    /// restricted to chunks matching `filter` when one is given.
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<QueryResult>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;

    /// Delete chunks by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<()>;

    /// Remove every stored chunk.
    async fn clear(&self) -> Result<()>;
}
