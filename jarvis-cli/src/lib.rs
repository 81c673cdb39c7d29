//! # jarvis-cli
//!
//! The `jarvis` binary: `ingest` builds the index from a documents directory,
//! `ask` answers one question, `chat` runs an interactive conversation.

pub mod cli;
pub mod commands;
pub mod providers;
pub mod settings;

pub use cli::{Cli, Command, Options};
pub use settings::Settings;
