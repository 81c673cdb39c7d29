//! Validated configuration derived from command-line options.

use std::time::Duration;

use anyhow::{Context, Result};
use jarvis_assistant::{AssistantConfig, NoContextPolicy};
use jarvis_rag::RagConfig;

use crate::cli::{NoContextArg, Options};
use crate::providers;

/// Retrieval and assistant configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rag: RagConfig,
    pub assistant: AssistantConfig,
}

impl Settings {
    /// Validate `options` into [`RagConfig`] and [`AssistantConfig`].
    pub fn from_options(options: &Options) -> Result<Self> {
        let mut rag = RagConfig::builder()
            .chunk_size(options.chunk_size)
            .chunk_overlap(options.chunk_overlap)
            .top_k(options.top_k)
            .embedding_model(providers::embedding_model(options))
            .distance_metric(options.distance_metric);
        if let Some(threshold) = options.score_threshold {
            rag = rag.score_threshold(threshold);
        }
        let rag = rag.build().context("invalid retrieval settings")?;

        let mut assistant = AssistantConfig::builder()
            .subject(&options.subject)
            .assistant_name(&options.assistant_name)
            .request_timeout(Duration::from_secs(options.timeout_secs))
            .condense_follow_ups(options.condense_follow_ups)
            .no_context_policy(match options.no_context {
                NoContextArg::Proceed => NoContextPolicy::ProceedWithoutContext,
                NoContextArg::Refuse => NoContextPolicy::Refuse,
            });
        if let Some(turns) = options.max_history_turns {
            assistant = assistant.max_history_turns(turns);
        }
        let assistant = assistant.build().context("invalid assistant settings")?;

        Ok(Self { rag, assistant })
    }
}
