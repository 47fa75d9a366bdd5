//! Data types for documents, chunks, retrieval candidates and ranked results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar metadata value attached to documents and chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(v) => write!(f, "{v}"),
            MetadataValue::Int(v) => write!(f, "{v}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::String(v) => f.write_str(v),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Int(value as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Key-value metadata. Ordered so that serialized output is stable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A loaded source document, before chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier derived from the source (file name, page suffix, ...).
    pub id: String,
    /// The extracted text.
    pub text: String,
    pub metadata: Metadata,
}

/// A bounded slice of a [`Document`]; the unit of embedding and retrieval.
///
/// The `id` is empty until the vector index assigns one on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    /// Parent document metadata plus chunk-specific fields such as `chunk_index`.
    pub metadata: Metadata,
}

/// Where a ranked result came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Vector,
}

/// A nearest-neighbour hit before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalCandidate {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    /// `None` when the index reported no distance at this position.
    pub raw_distance: Option<f32>,
}

/// A scored retrieval result. Scores lie in `[0, 1]`, higher is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
    pub source: ResultSource,
}
