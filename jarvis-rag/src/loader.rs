//! Loads plain-text source documents from a directory tree.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// File extensions treated as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Read every text document under `root`.
///
/// Files are visited in sorted order so ingestion is reproducible. A
/// document's id is its path relative to `root` with `/` separators; files with
/// other extensions are skipped.
///
/// # Errors
///
/// Returns [`RagError::Io`] if `root` cannot be walked or a file cannot be read
/// as UTF-8.
pub fn load_documents(root: impl AsRef<Path>) -> Result<Vec<Document>> {
    let root = root.as_ref();
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            RagError::Io(e.into_io_error().unwrap_or_else(|| std::io::Error::other("walk failed")))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_text_file(path) {
            debug!(path = %path.display(), "skipping non-text file");
            continue;
        }

        let text = fs::read_to_string(path)?;
        let id = path
            .strip_prefix(root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        documents.push(Document { id, source_path: path.display().to_string(), text });
    }

    info!(root = %root.display(), document_count = documents.len(), "loaded documents");
    Ok(documents)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}
