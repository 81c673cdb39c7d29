//! Data types for documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// A source document as supplied by the document loader.
///
/// Documents are only kept around for chunking; the index stores chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// Where the text came from (a file path for loaded documents).
    pub source_path: String,
    /// The raw text content of the document.
    pub text: String,
}

impl Document {
    /// Create a document whose source path is its id.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let id = id.into();
        Self { source_path: id.clone(), id, text: text.into() }
    }
}

/// A bounded span of a [`Document`].
///
/// `start_offset` and `end_offset` are byte offsets into the parent document's
/// text and always fall on character boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Start of the span in the parent text (inclusive).
    pub start_offset: usize,
    /// End of the span in the parent text (exclusive).
    pub end_offset: usize,
}

impl Chunk {
    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Returns `true` if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

/// A [`Chunk`] paired with its embedding vector, as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    /// The ID of the embedded chunk.
    pub chunk_id: String,
    /// The ID of the parent document.
    pub document_id: String,
    /// The chunk text.
    pub text: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    /// Attach an embedding to a chunk.
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk_id: chunk.id, document_id: chunk.document_id, text: chunk.text, vector }
    }
}

/// A single nearest-neighbour hit returned by an index search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// The ID of the matching chunk.
    pub chunk_id: String,
    /// Similarity (cosine) or distance (L2), depending on the index metric.
    pub score: f32,
}

/// A retrieved chunk resolved back to its text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// The ID of the chunk.
    pub chunk_id: String,
    /// The ID of the parent document.
    pub document_id: String,
    /// The chunk text.
    pub text: String,
    /// The score the index assigned to this chunk.
    pub score: f32,
}
