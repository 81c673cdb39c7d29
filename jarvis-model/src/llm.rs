//! The [`Llm`] trait and its request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Who authored a piece of conversation content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The assistant.
    Model,
}

/// One message in the conversation sent to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// The author of the message.
    pub role: Role,
    /// The message text.
    pub text: String,
}

impl Content {
    /// A user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    /// A model message.
    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling probability mass.
    pub top_p: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_output_tokens: Option<u32>,
}

/// A single generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Instructions that frame every turn.
    pub system_instruction: Option<String>,
    /// Conversation so far, oldest first, ending with the current user message.
    pub contents: Vec<Content>,
    /// Optional sampling parameters.
    pub config: Option<GenerationConfig>,
}

impl LlmRequest {
    /// Create a request from conversation contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents, ..Self::default() }
    }

    /// Set the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set sampling parameters.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The text of the last user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.contents.iter().rev().find(|c| c.role == Role::User).map(|c| c.text.as_str())
    }
}

/// A completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// Why generation stopped, as reported by the provider.
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    /// A response with only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), finish_reason: None }
    }
}

/// A text generation model.
///
/// Implementations do not retry; callers decide what to do with failures.
#[async_trait]
pub trait Llm: Send + Sync {
    /// The model identifier.
    fn name(&self) -> &str;

    /// Generate a reply to `request`.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}
