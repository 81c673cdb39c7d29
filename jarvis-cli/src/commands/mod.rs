//! Subcommand implementations.

pub mod ask;
pub mod chat;
pub mod ingest;

use std::sync::Arc;

use anyhow::{Context, Result};
use jarvis_assistant::{Assistant, Generator};
use jarvis_rag::{FlatIndex, Retriever, VectorIndex};
use tracing::{info, warn};

use crate::cli::Options;
use crate::providers;
use crate::settings::Settings;

/// Open the persisted index and wire up an [`Assistant`].
///
/// A missing, corrupt or incompatible index is fatal.
pub fn build_assistant(options: &Options, settings: &Settings) -> Result<Arc<Assistant>> {
    let embedder = providers::build_embedder(options)?;
    let index = FlatIndex::open(&options.index_path, embedder.dimensions(), embedder.model_name())
        .with_context(|| {
            format!(
                "cannot open index at {} (run `jarvis ingest` with the same embedding settings)",
                options.index_path.display()
            )
        })?;
    if index.spec().metric != settings.rag.distance_metric {
        warn!(
            index_metric = %index.spec().metric,
            configured_metric = %settings.rag.distance_metric,
            "index was built with a different metric; using the index metric"
        );
    }
    info!(path = %options.index_path.display(), chunk_count = index.len(), "index ready");

    let retriever = Retriever::new(embedder, Arc::new(index))?
        .with_score_threshold(settings.rag.score_threshold);
    let generator = Generator::from_config(providers::build_llm(options)?, &settings.assistant);

    let assistant = Assistant::builder()
        .retriever(Arc::new(retriever))
        .generator(generator)
        .config(settings.assistant.clone())
        .top_k(settings.rag.top_k)
        .build()?;
    Ok(Arc::new(assistant))
}
