//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] - prefers paragraph, line, sentence, clause and word
//!   boundaries, falling back to hard cuts
//! - [`FixedSizeChunker`] - hard cuts by size with configurable overlap
//!
//! Both work on byte offsets that are snapped to UTF-8 character boundaries, so
//! every [`Chunk`] records exactly which span of the source it covers. Adjacent
//! chunks of a document overlap by `chunk_overlap` bytes, and concatenating the
//! chunks minus their overlaps reproduces the source text (see [`reconstruct`]).

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Break candidates for [`RecursiveChunker`], highest priority first.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations must be deterministic: the same document and parameters
/// always yield the same chunk sequence.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn split(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Splits text at the best natural boundary inside each window.
///
/// Within a window of `chunk_size` bytes the chunker looks for the last
/// paragraph break, then line break, sentence end, clause separator and finally
/// space. A boundary is only accepted past `max(chunk_overlap, chunk_size / 2)`
/// so chunks stay reasonably full and every step makes progress. If no boundary
/// qualifies the window is cut hard.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_rag::{Chunker, Document, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.split(&Document::new("bio.txt", text))?;
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of bytes per chunk
    /// * `chunk_overlap` - number of bytes shared by consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Create a chunker from a validated [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, document: &Document) -> Result<Vec<Chunk>> {
        validate(self.chunk_size, self.chunk_overlap)?;
        let spans = split_spans(&document.text, self.chunk_size, self.chunk_overlap, SEPARATORS);
        Ok(spans_to_chunks(document, spans))
    }
}

/// Splits text into fixed-size windows with no regard for word boundaries.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, document: &Document) -> Result<Vec<Chunk>> {
        validate(self.chunk_size, self.chunk_overlap)?;
        let spans = split_spans(&document.text, self.chunk_size, self.chunk_overlap, &[]);
        Ok(spans_to_chunks(document, spans))
    }
}

/// Reassemble the source text from one document's chunks, dropping overlaps.
///
/// Chunks must be in the order the chunker produced them.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    let mut covered = 0usize;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start_offset);
        if skip < chunk.text.len() {
            text.push_str(&chunk.text[skip..]);
        }
        covered = covered.max(chunk.end_offset);
    }
    text
}

fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::ChunkingError("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::ChunkingError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Compute `(start, end)` byte spans covering `text`.
fn split_spans(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_char_boundary(text, start + chunk_size);
        if end <= start {
            // A single character wider than chunk_size.
            end = ceil_char_boundary(text, start + 1);
        }

        if end < text.len() {
            let min_break = start + chunk_overlap.max(chunk_size / 2);
            if let Some(brk) = find_break(text, start, end, min_break, separators) {
                end = brk;
            }
        }

        spans.push((start, end));
        if end >= text.len() {
            break;
        }

        let next = floor_char_boundary(text, end - chunk_overlap.min(end));
        start = if next > start { next } else { end };
    }

    spans
}

/// Find the end of the highest-priority separator in `text[start..end]` that
/// lies strictly past `min_break`.
fn find_break(
    text: &str,
    start: usize,
    end: usize,
    min_break: usize,
    separators: &[&str],
) -> Option<usize> {
    let window = &text[start..end];
    separators.iter().find_map(|separator| {
        window
            .rfind(separator)
            .map(|pos| start + pos + separator.len())
            .filter(|brk| *brk > min_break)
    })
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

fn spans_to_chunks(document: &Document, spans: Vec<(usize, usize)>) -> Vec<Chunk> {
    spans
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| Chunk {
            id: chunk_id(&document.id, i),
            document_id: document.id.clone(),
            text: document.text[start..end].to_string(),
            start_offset: start,
            end_offset: end,
        })
        .collect()
}

/// Chunk ids sort in positional order within a document.
fn chunk_id(document_id: &str, index: usize) -> String {
    format!("{document_id}#{index:05}")
}
