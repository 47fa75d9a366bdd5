//! Configuration for ingestion, retrieval and the chat service.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters shared by the pipeline components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from retrieval.
    pub top_k: usize,
    /// Minimum relevance score; ranked results below it are dropped.
    pub similarity_threshold: f32,
    /// Number of most recent conversation turns kept in the context window.
    pub history_limit: usize,
    /// Number of best-scoring documents kept in the context window and
    /// returned in chat replies.
    pub context_documents: usize,
    /// Name of the vector collection.
    pub collection: String,
    /// Confidence reported when retrieval succeeds but finds nothing.
    pub empty_result_confidence: f32,
    /// Confidence reported when the vector index fails.
    pub index_failure_confidence: f32,
    /// Number of characters of each document shown in chat replies.
    pub preview_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            similarity_threshold: 0.0,
            history_limit: 10,
            context_documents: 3,
            collection: "knowledge".to_string(),
            empty_result_confidence: 75.0,
            index_failure_confidence: 80.0,
            preview_chars: 200,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// Configs deserialized from files bypass the builder, so callers loading
    /// them should run this before use.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k`, `history_limit` or `context_documents` is zero
    /// - `similarity_threshold` is outside `[0, 1]`
    /// - either fallback confidence is outside `[0, 100]`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.history_limit == 0 {
            return Err(RagError::ConfigError(
                "history_limit must be greater than zero".to_string(),
            ));
        }
        if self.context_documents == 0 {
            return Err(RagError::ConfigError(
                "context_documents must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RagError::ConfigError(format!(
                "similarity_threshold ({}) must be within [0, 1]",
                self.similarity_threshold
            )));
        }
        for (name, value) in [
            ("empty_result_confidence", self.empty_result_confidence),
            ("index_failure_confidence", self.index_failure_confidence),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(RagError::ConfigError(format!(
                    "{name} ({value}) must be within [0, 100]"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from retrieval.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum relevance score for ranked results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn context_documents(mut self, count: usize) -> Self {
        self.config.context_documents = count;
        self
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the confidences reported on the two fallback paths.
    pub fn fallback_confidence(mut self, empty_result: f32, index_failure: f32) -> Self {
        self.config.empty_result_confidence = empty_result;
        self.config.index_failure_confidence = index_failure;
        self
    }

    pub fn preview_chars(mut self, chars: usize) -> Self {
        self.config.preview_chars = chars;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
