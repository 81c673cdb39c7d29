//! Embedding providers and the contract-enforcing [`Embedder`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (Gemini, OpenAI-compatible
/// servers, the local hash embedder) behind a unified async interface. The
/// default [`embed_batch`](EmbeddingProvider::embed_batch) implementation calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends that support
/// native batching should override it, keeping results identical to the
/// single-item path.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return the model identifier recorded alongside built indexes.
    fn model_name(&self) -> &str;
}

/// Wraps an [`EmbeddingProvider`] and enforces the embedding contract.
///
/// Every call rejects blank input, and every returned vector is checked for
/// the configured dimension and for non-finite values, so a misbehaving
/// backend can never poison the index.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("model", &self.provider.model_name())
            .field("dimensions", &self.provider.dimensions())
            .finish()
    }
}

impl Embedder {
    /// Wrap a provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Dimensionality of every vector this embedder returns.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// The underlying model identifier.
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] on blank input, on backend failure,
    /// or when the backend returns a vector of the wrong length or with
    /// non-finite values.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.check_input(text)?;
        let vector = self.provider.embed(text).await?;
        self.check_vector(&vector)?;
        Ok(vector)
    }

    /// Embed many texts at once. Results are in input order.
    ///
    /// An empty batch returns an empty result without calling the backend.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            self.check_input(text)?;
        }

        debug!(model = self.model_name(), batch_size = texts.len(), "embedding batch");
        let vectors = self.provider.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            error!(expected = texts.len(), actual = vectors.len(), "embedding count mismatch");
            return Err(self.error(format!(
                "backend returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &vectors {
            self.check_vector(vector)?;
        }
        Ok(vectors)
    }

    fn check_input(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(self.error("input text must not be empty"));
        }
        Ok(())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions() {
            return Err(self.error(format!(
                "expected {} dimensions, got {}",
                self.dimensions(),
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(self.error("embedding contains non-finite values"));
        }
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> RagError {
        RagError::embedding(self.model_name(), message)
    }
}
