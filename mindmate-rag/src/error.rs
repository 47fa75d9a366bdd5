//! Error types for the `mindmate-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting, indexing, or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index could not serve the request.
    #[error("Vector index error ({backend}): {message}")]
    IndexError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The loader has no reader for this file type.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A caller supplied an unusable argument (e.g. an empty chat message).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An error in pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    /// Whether this error means the vector index itself failed.
    ///
    /// The chat service treats these as "no knowledge available" and answers
    /// with fallback guidance instead of surfacing the failure.
    pub fn is_index_failure(&self) -> bool {
        matches!(self, RagError::IndexError { .. } | RagError::EmbeddingError { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_embedding_errors_count_as_index_failures() {
        let index = RagError::IndexError { backend: "InMemory".into(), message: "down".into() };
        let embed = RagError::EmbeddingError { provider: "Hashing".into(), message: "x".into() };
        assert!(index.is_index_failure());
        assert!(embed.is_index_failure());
        assert!(!RagError::InvalidInput("empty".into()).is_index_failure());
    }

    #[test]
    fn display_includes_backend() {
        let err = RagError::IndexError { backend: "InMemory".into(), message: "gone".into() };
        assert_eq!(err.to_string(), "Vector index error (InMemory): gone");
    }
}
