//! Vector index over embedded chunks.
//!
//! The [`VectorIndex`] trait is the read side used at query time.
//! [`FlatIndex`] is an exact brute-force implementation: it scores every entry
//! against the query, which is simple to verify and fast enough for corpora
//! below roughly a hundred thousand chunks. Indexes are immutable once built;
//! re-ingestion builds a new one and callers swap it in.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::{EmbeddedChunk, SearchHit};
use crate::error::{RagError, Result};

/// Version of the on-disk index format written by [`FlatIndex::persist`].
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// How neighbours are ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity; higher scores rank first.
    #[default]
    Cosine,
    /// Euclidean distance; lower scores rank first.
    L2,
}

impl DistanceMetric {
    /// Score `candidate` against `query`.
    pub fn score(self, query: &[f32], candidate: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(query, candidate),
            Self::L2 => {
                query.iter().zip(candidate).map(|(a, b)| (a - b) * (a - b)).sum::<f32>().sqrt()
            }
        }
    }

    /// Order two scores so the better match comes first.
    pub fn rank(self, a: f32, b: f32) -> Ordering {
        match self {
            Self::Cosine => b.total_cmp(&a),
            Self::L2 => a.total_cmp(&b),
        }
    }

    /// Whether `score` clears `threshold` (a floor for cosine, a ceiling for L2).
    pub fn passes(self, score: f32, threshold: f32) -> bool {
        match self {
            Self::Cosine => score >= threshold,
            Self::L2 => score <= threshold,
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::L2 => write!(f, "l2"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "l2" | "euclidean" => Ok(Self::L2),
            other => Err(RagError::ConfigError(format!("unknown distance metric '{other}'"))),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// The fixed parameters an index is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Length of every stored vector.
    pub dimensions: usize,
    /// Ranking metric.
    pub metric: DistanceMetric,
    /// The embedding model that produced the vectors.
    pub embedding_model: String,
}

impl IndexSpec {
    /// Create a spec.
    pub fn new(
        dimensions: usize,
        metric: DistanceMetric,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self { dimensions, metric, embedding_model: embedding_model.into() }
    }
}

/// Read access to a built index.
///
/// Implementations are immutable after construction and safe to search from
/// many tasks at once.
pub trait VectorIndex: Send + Sync {
    /// The parameters the index was built with.
    fn spec(&self) -> &IndexSpec;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    /// Returns `true` if the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a stored chunk by id.
    fn get(&self, chunk_id: &str) -> Option<&EmbeddedChunk>;

    /// Return up to `k` nearest neighbours of `query`, best first.
    ///
    /// Ties are broken by ascending chunk id.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `k == 0` or the query does not
    /// match the index dimension.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;
}

/// Exact nearest-neighbour index backed by a sorted `Vec`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    spec: IndexSpec,
    entries: Vec<EmbeddedChunk>,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    format_version: u32,
    spec: IndexSpec,
    entries: Vec<EmbeddedChunk>,
}

impl FlatIndex {
    /// Build an index from embedded chunks.
    ///
    /// Duplicate chunk ids keep the last occurrence. Entries are stored in chunk
    /// id order, so building twice from the same input gives equal indexes.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `spec.dimensions` is zero or
    /// any vector has the wrong length or non-finite values.
    pub fn build(spec: IndexSpec, chunks: impl IntoIterator<Item = EmbeddedChunk>) -> Result<Self> {
        if spec.dimensions == 0 {
            return Err(RagError::InvalidArgument("index dimensions must be non-zero".into()));
        }

        let mut by_id = BTreeMap::new();
        for chunk in chunks {
            if chunk.vector.len() != spec.dimensions {
                return Err(RagError::InvalidArgument(format!(
                    "chunk '{}' has {} dimensions, index expects {}",
                    chunk.chunk_id,
                    chunk.vector.len(),
                    spec.dimensions
                )));
            }
            if chunk.vector.iter().any(|v| !v.is_finite()) {
                return Err(RagError::InvalidArgument(format!(
                    "chunk '{}' has non-finite embedding values",
                    chunk.chunk_id
                )));
            }
            by_id.insert(chunk.chunk_id.clone(), chunk);
        }

        let entries: Vec<EmbeddedChunk> = by_id.into_values().collect();
        debug!(chunk_count = entries.len(), dimensions = spec.dimensions, "built flat index");
        Ok(Self { spec, entries })
    }

    /// An index with no entries.
    pub fn empty(spec: IndexSpec) -> Self {
        Self { spec, entries: Vec::new() }
    }

    /// All stored chunks in chunk id order.
    pub fn entries(&self) -> &[EmbeddedChunk] {
        &self.entries
    }

    /// Write the index to `path` as versioned JSON.
    ///
    /// The file is written next to its destination and renamed into place, so
    /// readers never observe a half-written index.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RagError::index(path, e.to_string()))?;
        }

        let tmp = temp_path(path);
        let write = || -> std::io::Result<()> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            let persisted = PersistedIndex {
                format_version: INDEX_FORMAT_VERSION,
                spec: self.spec.clone(),
                entries: self.entries.clone(),
            };
            serde_json::to_writer(&mut writer, &persisted)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(())
        };
        write().map_err(|e| RagError::index(path, format!("failed to write index: {e}")))?;
        fs::rename(&tmp, path)
            .map_err(|e| RagError::index(path, format!("failed to move index into place: {e}")))?;

        info!(path = %path.display(), chunk_count = self.entries.len(), "persisted index");
        Ok(())
    }

    /// Read an index written by [`persist`](Self::persist).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexError`] if the file is unreadable, is not a
    /// valid index, has an unsupported format version, or holds vectors that
    /// disagree with its declared dimension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RagError::index(path, format!("unreadable: {e}")))?;
        let persisted: PersistedIndex = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| RagError::index(path, format!("corrupt index: {e}")))?;

        if persisted.format_version != INDEX_FORMAT_VERSION {
            return Err(RagError::index(
                path,
                format!("unsupported format version {}", persisted.format_version),
            ));
        }

        let index = Self::build(persisted.spec, persisted.entries)
            .map_err(|e| RagError::index(path, e.to_string()))?;
        info!(path = %path.display(), chunk_count = index.len(), "loaded index");
        Ok(index)
    }

    /// Load an index and check that it was built by the given embedder.
    ///
    /// Mixing embedding models invalidates an index, so a mismatch fails fast.
    pub fn open(path: impl AsRef<Path>, dimensions: usize, embedding_model: &str) -> Result<Self> {
        let path = path.as_ref();
        let index = Self::load(path)?;
        if index.spec.dimensions != dimensions {
            return Err(RagError::index(
                path,
                format!(
                    "index has {} dimensions but the embedder produces {dimensions}",
                    index.spec.dimensions
                ),
            ));
        }
        if index.spec.embedding_model != embedding_model {
            return Err(RagError::index(
                path,
                format!(
                    "index was built with '{}' but the embedder is '{embedding_model}'",
                    index.spec.embedding_model
                ),
            ));
        }
        Ok(index)
    }
}

impl VectorIndex for FlatIndex {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, chunk_id: &str) -> Option<&EmbeddedChunk> {
        self.entries
            .binary_search_by(|entry| entry.chunk_id.as_str().cmp(chunk_id))
            .ok()
            .map(|i| &self.entries[i])
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be greater than zero".into()));
        }
        if query.len() != self.spec.dimensions {
            return Err(RagError::InvalidArgument(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                self.spec.dimensions
            )));
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(RagError::InvalidArgument("query has non-finite values".into()));
        }

        let metric = self.spec.metric;
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk_id: entry.chunk_id.clone(),
                score: metric.score(query, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            metric.rank(a.score, b.score).then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
