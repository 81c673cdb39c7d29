//! # jarvis-model
//!
//! Language model integrations for the Jarvis assistant.
//!
//! ## Overview
//!
//! - [`Llm`] - the generation trait the assistant depends on
//! - [`GeminiModel`] - Google's Gemini models over REST (feature `gemini`, on by default)
//! - [`MockLlm`] - scripted model for tests and offline runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jarvis_model::{Content, GeminiModel, Llm, LlmRequest};
//!
//! # async fn run() -> jarvis_model::Result<()> {
//! let api_key = std::env::var("GOOGLE_API_KEY").unwrap_or_default();
//! let model = GeminiModel::new(&api_key, "gemini-2.5-flash")?;
//! let reply = model.generate(LlmRequest::new(vec![Content::user("Hello")])).await?;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod llm;
pub mod mock;

pub use error::{ModelError, Result};
#[cfg(feature = "gemini")]
pub use gemini::GeminiModel;
pub use llm::{Content, GenerationConfig, Llm, LlmRequest, LlmResponse, Role};
pub use mock::MockLlm;
