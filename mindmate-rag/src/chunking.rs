//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] splits on the coarsest separator present
//!   (paragraphs, lines, sentences, words, characters) and merges pieces back
//!   into chunks with overlap
//! - [`FixedSizeChunker`] cuts fixed character windows with overlap
//!
//! Sizes are counted in Unicode scalar values, so a chunk boundary never
//! falls inside a character.

use std::collections::VecDeque;

use crate::document::{Document, DocumentChunk};

/// A strategy for splitting documents into chunks.
///
/// Implementations only decide where text is cut; [`chunk`](Chunker::chunk)
/// attaches the parent metadata and a `chunk_index` to each piece. Chunk ids
/// are left empty for the vector index to assign.
pub trait Chunker: Send + Sync {
    /// Split raw text into chunk texts.
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Split a document into chunks. Returns an empty `Vec` for blank text.
    fn chunk(&self, document: &Document) -> Vec<DocumentChunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.into());
                DocumentChunk { id: String::new(), content, metadata }
            })
            .collect()
    }

    /// Chunk several documents, preserving document order.
    fn chunk_all(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        documents.iter().flat_map(|d| self.chunk(d)).collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Clamp sizes so that every step makes progress.
fn sane_sizes(chunk_size: usize, chunk_overlap: usize) -> (usize, usize) {
    let chunk_size = chunk_size.max(1);
    (chunk_size, chunk_overlap.min(chunk_size - 1))
}

/// Splits text hierarchically and merges the pieces back up to `chunk_size`.
///
/// The first separator from `["\n\n", "\n", ". ", "! ", "? ", " ", ""]` that
/// occurs in the text is used. Pieces still longer than `chunk_size` are split
/// again with the remaining separators; the empty separator cuts between
/// characters. Consecutive chunks share up to `chunk_overlap` characters of
/// trailing pieces.
///
/// # Example
///
/// ```rust,ignore
/// use mindmate_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

const SEPARATORS: [&str; 7] = ["\n\n", "\n", ". ", "! ", "? ", " ", ""];

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// `chunk_size` is raised to at least 1 and `chunk_overlap` is capped
    /// below it.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let (chunk_size, chunk_overlap) = sane_sizes(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position =
            separators.iter().position(|sep| sep.is_empty() || text.contains(sep)).unwrap_or(0);
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
        } else {
            split_keeping_separator(text, separator)
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, carrying a tail of at most
    /// `chunk_overlap` characters into the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window);
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }
        push_joined(&mut chunks, &window);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

impl Chunker for RecursiveChunker {
    fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &SEPARATORS)
    }
}

/// Splits text into fixed-size character windows with configurable overlap.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let (chunk_size, chunk_overlap) = sane_sizes(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}
