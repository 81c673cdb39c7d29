//! Configuration for chunking, embedding and retrieval.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::index::DistanceMetric;

/// Default embedding model, matching the local hash embedder's default width.
pub const DEFAULT_EMBEDDING_MODEL: &str = "hash-384";

/// Configuration parameters for ingestion and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in bytes.
    pub chunk_size: usize,
    /// Number of bytes shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks to retrieve per question.
    pub top_k: usize,
    /// Name of the embedding model the index is built with.
    pub embedding_model: String,
    /// Metric used to rank neighbours.
    pub distance_metric: DistanceMetric,
    /// Optional cut-off: minimum similarity for cosine, maximum distance for L2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            distance_metric: DistanceMetric::Cosine,
            score_threshold: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in bytes.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in bytes.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the embedding model name.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the distance metric.
    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.config.distance_metric = metric;
        self
    }

    /// Set the score threshold used to drop weak matches.
    pub fn score_threshold(mut self, threshold: f32) -> Self {
        self.config.score_threshold = Some(threshold);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embedding_model` is blank
    /// - `score_threshold` is not finite
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if config.embedding_model.trim().is_empty() {
            return Err(RagError::ConfigError("embedding_model must not be empty".to_string()));
        }
        if config.score_threshold.is_some_and(|t| !t.is_finite()) {
            return Err(RagError::ConfigError("score_threshold must be finite".to_string()));
        }
        Ok(config)
    }
}
