//! File loading for the ingestion boundary.
//!
//! [`DocumentLoader`] picks a reader from the file extension. Plain-text
//! formats are read as UTF-8; binary office formats are recognised but
//! rejected with [`RagError::UnsupportedFileType`].

use std::path::Path;

use tracing::{debug, info};

use crate::chunking::Chunker;
use crate::document::{Document, DocumentChunk, Metadata};
use crate::error::{RagError, Result};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv", "json", "log", "rst", "html"];
const BINARY_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx"];

/// Loads files into [`Document`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Whether the loader has a reader for `path`'s extension.
    pub fn can_load(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Load the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFileType`] for unknown or binary
    /// extensions, and [`RagError::Io`] if the file cannot be read as UTF-8.
    pub async fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let ext = extension(path).unwrap_or_default();
        if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
            if BINARY_EXTENSIONS.contains(&ext.as_str()) {
                debug!(path = %path.display(), ext, "no text extractor for binary format");
            }
            let shown = if ext.is_empty() { path.display().to_string() } else { format!(".{ext}") };
            return Err(RagError::UnsupportedFileType(shown));
        }

        let text = tokio::fs::read_to_string(path).await?;
        let file_name =
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), path.display().to_string().into());
        metadata.insert("file_name".to_string(), file_name.clone().into());

        info!(path = %path.display(), chars = text.chars().count(), "loaded document");
        Ok(vec![Document { id: file_name, text, metadata }])
    }

    /// Load `path` and split it with `chunker`.
    pub async fn load_and_chunk(
        &self,
        path: &Path,
        chunker: &dyn Chunker,
    ) -> Result<Vec<DocumentChunk>> {
        let documents = self.load(path).await?;
        let chunks = chunker.chunk_all(&documents);
        info!(path = %path.display(), chunk_count = chunks.len(), "chunked document");
        Ok(chunks)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RecursiveChunker;
    use crate::document::MetadataValue;

    #[tokio::test]
    async fn text_files_load_with_source_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Goa.MD");
        std::fs::write(&path, "# Goa\n\nBeaches and markets.").unwrap();

        let docs = DocumentLoader::new().load(&path).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "Goa.MD");
        assert_eq!(docs[0].metadata["file_name"], MetadataValue::String("Goa.MD".into()));
        assert!(docs[0].metadata.contains_key("source"));
    }

    #[tokio::test]
    async fn binary_formats_are_unsupported() {
        let err = DocumentLoader::new().load(Path::new("guide.pdf")).await.unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFileType(ref ext) if ext == ".pdf"));

        let err = DocumentLoader::new().load(Path::new("noext")).await.unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFileType(_)));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentLoader::new().load(&dir.path().join("absent.txt")).await.unwrap_err();
        assert!(matches!(err, RagError::Io(_)));
    }

    #[tokio::test]
    async fn load_and_chunk_numbers_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "first paragraph\n\nsecond paragraph").unwrap();

        let chunks =
            DocumentLoader::new().load_and_chunk(&path, &RecursiveChunker::new(20, 0)).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].metadata["chunk_index"], MetadataValue::Int(1));
    }

    #[test]
    fn can_load_is_case_insensitive() {
        let loader = DocumentLoader::new();
        assert!(loader.can_load(Path::new("a.TXT")));
        assert!(!loader.can_load(Path::new("a.docx")));
    }
}
