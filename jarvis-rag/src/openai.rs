//! OpenAI-compatible embedding provider.
//!
//! Talks to any server exposing the `/v1/embeddings` endpoint: OpenAI itself,
//! or a self-hosted server running a sentence-transformer such as
//! `all-MiniLM-L6-v2`.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Default bound on a single embeddings request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "OpenAI";

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")
///     .with_base_url("http://localhost:8080/v1")
///     .with_model("sentence-transformers/all-MiniLM-L6-v2", 384);
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
    timeout: Duration,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// Self-hosted servers often accept any key, so the key is only checked
    /// when a request is made: an empty key is rejected for the default
    /// OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the provider at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name and the dimensionality it produces.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Ask the API to truncate embeddings to `dims` (Matryoshka support).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Bound each embeddings request, including connecting and reading the body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn check_key(&self) -> Result<()> {
        if self.api_key.is_empty() && self.base_url == OPENAI_API_BASE {
            return Err(RagError::embedding(PROVIDER, "API key must not be empty"));
        }
        Ok(())
    }
}

// ── OpenAI API request/response types ──

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ──

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.check_key()?;

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<error body unreadable: {e}>"),
            };
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::embedding(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected_only_for_the_default_endpoint() {
        assert!(OpenAIEmbeddingProvider::new("").check_key().is_err());

        let local = OpenAIEmbeddingProvider::new("").with_base_url("http://localhost:8080/v1/");
        assert!(local.check_key().is_ok());
        assert_eq!(local.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn builders_set_model_dimensions_and_timeout() {
        let provider = OpenAIEmbeddingProvider::new("sk-test")
            .with_model("all-MiniLM-L6-v2", 384)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(provider.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.timeout, Duration::from_secs(5));
        assert_eq!(OpenAIEmbeddingProvider::new("k").timeout, DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn unreachable_server_is_an_embedding_error() {
        let provider = OpenAIEmbeddingProvider::new("")
            .with_base_url("http://127.0.0.1:9/v1")
            .with_timeout(Duration::from_millis(500));
        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
    }
}
