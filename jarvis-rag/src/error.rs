//! Error types for the `jarvis-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while chunking, embedding, indexing or retrieving.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller-supplied argument was rejected before any I/O took place.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Retrieval could not run, e.g. because the index holds no chunks.
    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    /// A persisted index is unreadable, corrupt or incompatible.
    #[error("Index error ({}): {message}", path.display())]
    IndexError {
        /// The index file involved.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error while reading source documents.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub(crate) fn index(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IndexError { path: path.into(), message: message.into() }
    }

    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
