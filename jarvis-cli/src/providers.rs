//! Embedding and language model construction from options.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use jarvis_model::{GeminiModel, Llm};
use jarvis_rag::{
    Embedder, GeminiEmbeddingProvider, HashEmbeddingProvider, OpenAIEmbeddingProvider,
};

use crate::cli::{EmbeddingProviderKind, Options};

const GEMINI_EMBEDDING_MODEL: &str = "text-embedding-004";
const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The model name the configured embedder reports.
pub fn embedding_model(options: &Options) -> String {
    match options.embedding_provider {
        EmbeddingProviderKind::Hash => format!("hash-{}", hash_dimensions(options)),
        EmbeddingProviderKind::Gemini => {
            let model = options.embedding_model.as_deref().unwrap_or(GEMINI_EMBEDDING_MODEL);
            model.strip_prefix("models/").unwrap_or(model).to_string()
        }
        EmbeddingProviderKind::Openai => {
            options.embedding_model.clone().unwrap_or_else(|| OPENAI_EMBEDDING_MODEL.to_string())
        }
    }
}

fn hash_dimensions(options: &Options) -> usize {
    options.embedding_dimensions.unwrap_or(HashEmbeddingProvider::DEFAULT_DIMENSIONS)
}

fn custom_model_dimensions(options: &Options, model: &str) -> Result<usize> {
    options
        .embedding_dimensions
        .with_context(|| {
            format!("--embedding-dimensions is required for embedding model '{model}'")
        })
}

/// Build the embedder selected by `--embedding-provider`.
pub fn build_embedder(options: &Options) -> Result<Embedder> {
    let timeout = Duration::from_secs(options.timeout_secs);
    let embedder = match options.embedding_provider {
        EmbeddingProviderKind::Hash => {
            if options.embedding_model.is_some() {
                tracing::warn!("--embedding-model is ignored by the hash embedder");
            }
            Embedder::new(Arc::new(HashEmbeddingProvider::new(hash_dimensions(options))))
        }
        EmbeddingProviderKind::Gemini => {
            let api_key = options
                .embedding_api_key
                .as_deref()
                .or(options.google_api_key.as_deref())
                .context(
                    "GOOGLE_API_KEY or JARVIS_EMBEDDING_API_KEY must be set for Gemini embeddings",
                )?;
            let mut provider = GeminiEmbeddingProvider::new(api_key)?.with_timeout(timeout);
            match &options.embedding_model {
                Some(model) => {
                    provider = provider.with_model(model, custom_model_dimensions(options, model)?)
                }
                None => {
                    if let Some(dims) = options.embedding_dimensions {
                        provider = provider.with_output_dimensionality(dims);
                    }
                }
            }
            if let Some(url) = &options.embedding_base_url {
                provider = provider.with_base_url(url);
            }
            Embedder::new(Arc::new(provider))
        }
        EmbeddingProviderKind::Openai => {
            let api_key = options.embedding_api_key.clone().unwrap_or_default();
            let mut provider = OpenAIEmbeddingProvider::new(api_key).with_timeout(timeout);
            if let Some(url) = &options.embedding_base_url {
                provider = provider.with_base_url(url);
            }
            match &options.embedding_model {
                Some(model) => {
                    provider = provider.with_model(model, custom_model_dimensions(options, model)?)
                }
                None => {
                    if let Some(dims) = options.embedding_dimensions {
                        provider = provider.with_dimensions(dims);
                    }
                }
            }
            Embedder::new(Arc::new(provider))
        }
    };
    Ok(embedder)
}

/// Build the Gemini chat model.
pub fn build_llm(options: &Options) -> Result<Arc<dyn Llm>> {
    let Some(api_key) = options.google_api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        bail!(
            "GOOGLE_API_KEY must be set to answer questions \
             (get one at https://aistudio.google.com/apikey)"
        );
    };
    let model = GeminiModel::new(api_key, &options.model)?
        .with_timeout(Duration::from_secs(options.timeout_secs));
    Ok(Arc::new(model))
}
