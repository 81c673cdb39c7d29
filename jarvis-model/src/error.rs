//! Error types for model calls.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`Llm`](crate::Llm) implementations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model client was misconfigured (e.g. missing API key).
    #[error("Model configuration error: {0}")]
    Config(String),

    /// The request could not be sent or the connection failed.
    #[error("Model request failed: {0}")]
    Request(String),

    /// The call did not complete in time.
    #[error("Model call timed out after {after:?}")]
    Timeout {
        /// The deadline that expired.
        after: Duration,
    },

    /// The provider rejected the call for rate or quota reasons.
    #[error("Model quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The provider returned a non-success status.
    #[error("Model API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider error detail.
        message: String,
    },

    /// The provider answered without any text.
    #[error("Model returned no text: {0}")]
    EmptyResponse(String),

    /// The provider's response could not be parsed.
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

/// A convenience result type for model calls.
pub type Result<T> = std::result::Result<T, ModelError>;
