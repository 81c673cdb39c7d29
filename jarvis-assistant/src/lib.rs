//! # jarvis-assistant
//!
//! The question-answering half of Jarvis: a prompt policy that keeps the
//! model on one subject, a [`Generator`] that calls the model, and the
//! [`Assistant`] that runs retrieve, generate and remember as one step.
//!
//! ## Overview
//!
//! - [`AssistantConfig`] - persona, history bound, timeout and empty-index policy
//! - [`PromptTemplate`] - system instruction, context block and canned refusal
//! - [`Generator`] - builds the request and bounds the model call
//! - [`Assistant`] - `ask` / `reset` / `history` over a shared session
//!
//! ## Known limitation
//!
//! Out-of-domain refusal is requested in the prompt, not enforced. A model
//! can still answer off-topic questions; [`Answer::refused`] only reports
//! whether the reply contained the canned refusal.

pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;

pub use config::{AssistantConfig, AssistantConfigBuilder, NoContextPolicy};
pub use error::{AssistantError, Result};
pub use generator::{Answer, Generator, NO_CONTEXT_NOTE, PromptTemplate};
pub use pipeline::{Assistant, AssistantBuilder};
