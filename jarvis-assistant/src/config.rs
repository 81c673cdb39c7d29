//! Assistant configuration.

use std::time::Duration;

use crate::error::{AssistantError, Result};

/// Default subject the assistant answers questions about.
pub const DEFAULT_SUBJECT: &str = "Ankit";
/// Default assistant persona name.
pub const DEFAULT_ASSISTANT_NAME: &str = "Jarvis";
/// Default bound on each model call and on each retrieval.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when retrieval cannot run because the index is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoContextPolicy {
    /// Call the model with a "no relevant context found" note.
    #[default]
    ProceedWithoutContext,
    /// Answer with the canned refusal without calling the model.
    Refuse,
}

/// Settings for an [`Assistant`](crate::Assistant).
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// The person the assistant answers questions about.
    pub subject: String,
    /// The name the assistant introduces itself with.
    pub assistant_name: String,
    /// Maximum retained turns; `None` keeps the whole conversation.
    pub max_history_turns: Option<usize>,
    /// Upper bound on each model call and on each retrieval.
    pub request_timeout: Duration,
    /// Fallback when the index holds no chunks.
    pub no_context_policy: NoContextPolicy,
    /// Rewrite follow-ups into standalone questions before retrieval. Costs
    /// one extra model call per question once the conversation has history.
    pub condense_follow_ups: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            max_history_turns: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            no_context_policy: NoContextPolicy::default(),
            condense_follow_ups: false,
        }
    }
}

impl AssistantConfig {
    /// Create a new [`AssistantConfigBuilder`] seeded with defaults.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::default()
    }
}

/// Builder for [`AssistantConfig`] with validation.
#[derive(Debug, Clone, Default)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    /// Set the subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.config.subject = subject.into();
        self
    }

    /// Set the assistant name.
    pub fn assistant_name(mut self, name: impl Into<String>) -> Self {
        self.config.assistant_name = name.into();
        self
    }

    /// Keep at most `turns` turns of history.
    pub fn max_history_turns(mut self, turns: usize) -> Self {
        self.config.max_history_turns = Some(turns);
        self
    }

    /// Set the per-call timeout for retrieval and for the model.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the empty-index fallback.
    pub fn no_context_policy(mut self, policy: NoContextPolicy) -> Self {
        self.config.no_context_policy = policy;
        self
    }

    /// Enable or disable rewriting follow-ups before retrieval.
    pub fn condense_follow_ups(mut self, enabled: bool) -> Self {
        self.config.condense_follow_ups = enabled;
        self
    }

    /// Validate and return the config.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the subject or name is blank, the
    /// history bound is zero, or the timeout is zero.
    pub fn build(self) -> Result<AssistantConfig> {
        let config = self.config;
        if config.subject.trim().is_empty() {
            return Err(AssistantError::Config("subject must not be empty".into()));
        }
        if config.assistant_name.trim().is_empty() {
            return Err(AssistantError::Config("assistant_name must not be empty".into()));
        }
        if config.max_history_turns == Some(0) {
            return Err(AssistantError::Config(
                "max_history_turns must be greater than zero".into(),
            ));
        }
        if config.request_timeout.is_zero() {
            return Err(AssistantError::Config("request_timeout must be greater than zero".into()));
        }
        Ok(config)
    }
}
