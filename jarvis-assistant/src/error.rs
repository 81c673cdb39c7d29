//! Error types for the `jarvis-assistant` crate.

use jarvis_memory::MemoryError;
use jarvis_model::ModelError;
use jarvis_rag::RagError;
use thiserror::Error;

/// Errors surfaced by [`Assistant::ask`](crate::Assistant::ask) and friends.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The question was rejected before any I/O took place.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Retrieving context failed (embedding, search or an empty index).
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RagError),

    /// The language model failed, timed out or ran out of quota.
    #[error("Generation failed: {0}")]
    Generation(#[from] ModelError),

    /// The assistant was misconfigured.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<MemoryError> for AssistantError {
    fn from(err: MemoryError) -> Self {
        Self::Config(err.to_string())
    }
}

/// A convenience result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
