//! # jarvis-telemetry
//!
//! Logging setup shared by the Jarvis binaries.
//!
//! ```rust,no_run
//! jarvis_telemetry::init_telemetry("jarvis");
//! tracing::info!("ready");
//! ```

pub mod init;

pub use init::{DEFAULT_FILTER, LogFormat, init_telemetry, init_with_format};

// Re-export tracing so callers need a single dependency for instrumentation.
pub use tracing;
