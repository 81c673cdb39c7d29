//! Query-time retrieval: embed the question, search the index, resolve text.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::document::RetrievedChunk;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Retrieves the chunks most relevant to a query.
///
/// The index sits behind an `RwLock<Arc<_>>`: searches clone the `Arc` and
/// release the lock immediately, and [`replace_index`](Self::replace_index)
/// swaps in a freshly built index without disturbing searches in flight.
pub struct Retriever {
    embedder: Embedder,
    index: RwLock<Arc<dyn VectorIndex>>,
    score_threshold: Option<f32>,
}

impl Retriever {
    /// Create a retriever over `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the embedder's dimension differs
    /// from the index's.
    pub fn new(embedder: Embedder, index: Arc<dyn VectorIndex>) -> Result<Self> {
        check_dimensions(&embedder, index.as_ref())?;
        Ok(Self { embedder, index: RwLock::new(index), score_threshold: None })
    }

    /// Drop hits that do not clear `threshold` under the index metric.
    pub fn with_score_threshold(mut self, threshold: Option<f32>) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// The embedder used for queries.
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// The index currently served.
    pub async fn index(&self) -> Arc<dyn VectorIndex> {
        Arc::clone(&*self.index.read().await)
    }

    /// Swap in a new index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the new index's dimension does not
    /// match the embedder; the current index stays in place.
    pub async fn replace_index(&self, index: Arc<dyn VectorIndex>) -> Result<()> {
        check_dimensions(&self.embedder, index.as_ref())?;
        let chunk_count = index.len();
        *self.index.write().await = index;
        info!(chunk_count, "replaced retrieval index");
        Ok(())
    }

    /// Return up to `k` chunks relevant to `query`, best first.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] for a blank query or `k == 0`, before any I/O
    /// - [`RagError::RetrievalError`] if the index holds no chunks
    /// - [`RagError::EmbeddingError`] if embedding the query fails
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidArgument("query must not be empty".into()));
        }
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be greater than zero".into()));
        }

        let index = self.index().await;
        if index.is_empty() {
            warn!("retrieval requested against an empty index");
            return Err(RagError::RetrievalError("the index contains no chunks".into()));
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = index.search(&query_vector, k)?;
        let metric = index.spec().metric;

        let retrieved: Vec<RetrievedChunk> = hits
            .into_iter()
            .filter(|hit| self.score_threshold.is_none_or(|t| metric.passes(hit.score, t)))
            .filter_map(|hit| {
                index.get(&hit.chunk_id).map(|entry| RetrievedChunk {
                    chunk_id: hit.chunk_id,
                    document_id: entry.document_id.clone(),
                    text: entry.text.clone(),
                    score: hit.score,
                })
            })
            .collect();

        debug!(query_len = query.len(), k, result_count = retrieved.len(), "retrieval completed");
        Ok(retrieved)
    }
}

fn check_dimensions(embedder: &Embedder, index: &dyn VectorIndex) -> Result<()> {
    let expected = index.spec().dimensions;
    if embedder.dimensions() != expected {
        return Err(RagError::ConfigError(format!(
            "embedder produces {} dimensions but the index expects {expected}",
            embedder.dimensions()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EmbeddedChunk;
    use crate::hash::HashEmbeddingProvider;
    use crate::index::{DistanceMetric, FlatIndex, IndexSpec};

    async fn retriever(texts: &[(&str, &str)]) -> Retriever {
        let embedder = Embedder::new(Arc::new(HashEmbeddingProvider::new(128)));
        let mut entries = Vec::new();
        for (id, text) in texts {
            entries.push(EmbeddedChunk {
                chunk_id: id.to_string(),
                document_id: "bio".to_string(),
                text: text.to_string(),
                vector: embedder.embed(text).await.unwrap(),
            });
        }
        let spec = IndexSpec::new(128, DistanceMetric::Cosine, embedder.model_name());
        let index = FlatIndex::build(spec, entries).unwrap();
        Retriever::new(embedder, Arc::new(index)).unwrap()
    }

    #[tokio::test]
    async fn returns_the_matching_chunk() {
        let retriever = retriever(&[
            ("bio#00000", "Ankit was born in 1995."),
            ("bio#00001", "Ankit works as an engineer."),
        ])
        .await;
        let results = retriever.retrieve("When was Ankit born?", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "Ankit was born in 1995.");
    }

    #[tokio::test]
    async fn rejects_blank_query_and_zero_k() {
        let retriever = retriever(&[("a", "text")]).await;
        assert!(matches!(retriever.retrieve("  ", 1).await, Err(RagError::InvalidArgument(_))));
        assert!(matches!(retriever.retrieve("text", 0).await, Err(RagError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn empty_index_is_a_retrieval_error() {
        let retriever = retriever(&[]).await;
        let result = retriever.retrieve("anything", 3).await;
        assert!(matches!(result, Err(RagError::RetrievalError(_))));
    }

    #[tokio::test]
    async fn threshold_drops_unrelated_chunks() {
        let retriever = retriever(&[("a", "Ankit was born in 1995.")])
            .await
            .with_score_threshold(Some(0.2));
        assert!(retriever.retrieve("weather forecast tomorrow", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_index_checks_dimensions() {
        let retriever = retriever(&[("a", "text")]).await;
        let wrong = FlatIndex::empty(IndexSpec::new(4, DistanceMetric::Cosine, "hash-4"));
        assert!(retriever.replace_index(Arc::new(wrong)).await.is_err());
        assert_eq!(retriever.index().await.len(), 1);

        let empty = FlatIndex::empty(IndexSpec::new(128, DistanceMetric::Cosine, "hash-128"));
        retriever.replace_index(Arc::new(empty)).await.unwrap();
        assert!(retriever.index().await.is_empty());
    }
}
