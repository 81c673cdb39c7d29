//! # jarvis-rag
//!
//! Retrieval half of the Jarvis assistant: turns source documents into an
//! index of embedded chunks, and answers "which chunks are relevant to this
//! question" at query time.
//!
//! ## Overview
//!
//! - [`Chunker`] - splits documents into overlapping spans
//!   ([`RecursiveChunker`], [`FixedSizeChunker`])
//! - [`EmbeddingProvider`] - embedding backends; [`Embedder`] enforces their contract
//! - [`VectorIndex`] - nearest-neighbour search; [`FlatIndex`] is exact and persistable
//! - [`Retriever`] - embeds a query and resolves the top-k chunks
//! - [`IndexBuilder`] - offline ingestion from [`Document`]s
//!
//! ## Feature Flags
//!
//! | Feature | Provides |
//! |---------|----------|
//! | `gemini` | `GeminiEmbeddingProvider` |
//! | `openai` | `OpenAIEmbeddingProvider` for OpenAI-compatible servers |
//! | `full` | Everything above |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jarvis_rag::{
//!     Embedder, FlatIndex, HashEmbeddingProvider, IndexBuilder, RagConfig, Retriever,
//! };
//!
//! let config = RagConfig::builder().chunk_size(500).chunk_overlap(50).build()?;
//! let embedder = Embedder::new(Arc::new(HashEmbeddingProvider::default()));
//! let index = IndexBuilder::from_config(&config, embedder.clone()).build(&documents).await?;
//! let retriever = Retriever::new(embedder, Arc::new(index))?;
//! let chunks = retriever.retrieve("When was Ankit born?", config.top_k).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hash;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod retriever;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, reconstruct};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, EmbeddedChunk, RetrievedChunk, SearchHit};
pub use embedding::{Embedder, EmbeddingProvider};
pub use error::{RagError, Result};
pub use hash::HashEmbeddingProvider;
pub use index::{DistanceMetric, FlatIndex, IndexSpec, VectorIndex};
pub use ingest::IndexBuilder;
pub use loader::load_documents;
pub use retriever::Retriever;

#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbeddingProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
