use std::path::Path;

use anyhow::{Context, Result};
use jarvis_rag::{IndexBuilder, VectorIndex, load_documents};
use tracing::warn;

use crate::cli::Options;
use crate::providers;
use crate::settings::Settings;

/// Rebuild the index from `documents_dir` and persist it.
pub async fn run(options: &Options, settings: &Settings, documents_dir: &Path) -> Result<()> {
    let documents = load_documents(documents_dir)
        .with_context(|| format!("failed to read documents from {}", documents_dir.display()))?;
    if documents.is_empty() {
        warn!(
            dir = %documents_dir.display(),
            "no .txt or .md documents found; writing an empty index"
        );
    }

    let embedder = providers::build_embedder(options)?;
    let index = IndexBuilder::from_config(&settings.rag, embedder).build(&documents).await?;
    index.persist(&options.index_path)?;

    println!(
        "Indexed {} chunk(s) from {} document(s) into {}",
        index.len(),
        documents.len(),
        options.index_path.display()
    );
    Ok(())
}
