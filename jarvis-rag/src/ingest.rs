//! Offline ingestion: documents → chunks → embeddings → [`FlatIndex`].
//!
//! # Example
//!
//! ```rust,ignore
//! use jarvis_rag::{load_documents, IndexBuilder, RagConfig};
//!
//! let documents = load_documents("documents")?;
//! let index = IndexBuilder::from_config(&config, embedder).build(&documents).await?;
//! index.persist("data/index.json")?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, EmbeddedChunk};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::{DistanceMetric, FlatIndex, IndexSpec, VectorIndex};

/// Default number of chunks sent to the embedder per request.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Builds a [`FlatIndex`] from scratch out of source documents.
pub struct IndexBuilder {
    chunker: Arc<dyn Chunker>,
    embedder: Embedder,
    metric: DistanceMetric,
    batch_size: usize,
}

impl IndexBuilder {
    /// Create a builder from its parts.
    pub fn new(chunker: Arc<dyn Chunker>, embedder: Embedder, metric: DistanceMetric) -> Self {
        Self { chunker, embedder, metric, batch_size: DEFAULT_BATCH_SIZE }
    }

    /// Create a builder using a [`RecursiveChunker`] and the metric from `config`.
    pub fn from_config(config: &RagConfig, embedder: Embedder) -> Self {
        Self::new(Arc::new(RecursiveChunker::from_config(config)), embedder, config.distance_metric)
    }

    /// Set how many chunks are embedded per backend call. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Chunk, embed and index `documents`.
    ///
    /// Whitespace-only chunks are not indexed. The returned index is always
    /// built from scratch; nothing is merged into an existing one.
    ///
    /// # Errors
    ///
    /// Propagates chunking and embedding failures; no partial index is returned.
    pub async fn build(&self, documents: &[Document]) -> Result<FlatIndex> {
        let mut chunks: Vec<Chunk> = Vec::new();
        for document in documents {
            let document_chunks = self.chunker.split(document)?;
            debug!(
                document.id = %document.id,
                chunk_count = document_chunks.len(),
                "chunked document"
            );
            chunks.extend(document_chunks.into_iter().filter(|c| !c.text.trim().is_empty()));
        }

        let mut embedded = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = self
                .embedder
                .embed_batch(&texts)
                .await
                .inspect_err(|e| error!(error = %e, "embedding failed during ingestion"))?;
            embedded
                .extend(batch.iter().cloned().zip(vectors).map(|(c, v)| EmbeddedChunk::new(c, v)));
        }

        let spec =
            IndexSpec::new(self.embedder.dimensions(), self.metric, self.embedder.model_name());
        let index = FlatIndex::build(spec, embedded)?;
        info!(document_count = documents.len(), chunk_count = index.len(), "built index");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashEmbeddingProvider;

    fn builder(chunk_size: usize) -> IndexBuilder {
        let embedder = Embedder::new(Arc::new(HashEmbeddingProvider::new(64)));
        IndexBuilder::new(
            Arc::new(RecursiveChunker::new(chunk_size, 0)),
            embedder,
            DistanceMetric::Cosine,
        )
        .with_batch_size(1)
    }

    #[tokio::test]
    async fn indexes_every_chunk() {
        let docs = vec![
            Document::new("a", "Ankit was born in 1995."),
            Document::new("b", "Ankit works as an engineer."),
        ];
        let index = builder(50).build(&docs).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.spec().embedding_model, "hash-64");
        assert_eq!(index.get("b#00000").unwrap().text, "Ankit works as an engineer.");
    }

    #[tokio::test]
    async fn skips_blank_documents_and_chunks() {
        let docs = vec![Document::new("blank", "   \n\n  "), Document::new("empty", "")];
        let index = builder(4).build(&docs).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn building_twice_is_identical() {
        let docs = vec![Document::new("a", "One. Two. Three. Four. Five. Six.")];
        let builder = builder(12);
        assert_eq!(builder.build(&docs).await.unwrap(), builder.build(&docs).await.unwrap());
    }
}
