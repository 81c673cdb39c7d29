//! Gemini model over the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::llm::{Content, GenerationConfig, Llm, LlmRequest, LlmResponse, Role};

/// The default Generative Language API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default bound on a single HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini chat model.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_model::GeminiModel;
///
/// let model = GeminiModel::new(std::env::var("GOOGLE_API_KEY")?, "gemini-2.5-flash")?;
/// ```
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiModel {
    /// Create a client for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the API key or model name is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(ModelError::Config("Gemini API key must not be empty".into()));
        }
        if model.trim().is_empty() {
            return Err(ModelError::Config("model name must not be empty".into()));
        }

        let model = model.strip_prefix("models/").map(str::to_string).unwrap_or(model);
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: GEMINI_API_BASE.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound each HTTP request, including reading the response body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client (proxies, connect timeouts).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

// ── Gemini API request/response types ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: WireContent,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn text_content(role: Option<&str>, text: &str) -> WireContent {
    WireContent {
        role: role.map(str::to_string),
        parts: vec![WirePart { text: Some(text.to_string()) }],
    }
}

fn to_wire(request: &LlmRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: request.system_instruction.as_deref().map(|s| text_content(None, s)),
        contents: request.contents.iter().map(content_to_wire).collect(),
        generation_config: request.config.as_ref().map(config_to_wire),
    }
}

fn content_to_wire(content: &Content) -> WireContent {
    let role = match content.role {
        Role::User => "user",
        Role::Model => "model",
    };
    text_content(Some(role), &content.text)
}

fn config_to_wire(config: &GenerationConfig) -> WireGenerationConfig {
    WireGenerationConfig {
        temperature: config.temperature,
        top_p: config.top_p,
        max_output_tokens: config.max_output_tokens,
    }
}

fn from_wire(response: GenerateContentResponse) -> Result<LlmResponse> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ModelError::EmptyResponse(reason));
    };

    let text: String = candidate.content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "empty candidate".to_string());
        return Err(ModelError::EmptyResponse(reason));
    }
    Ok(LlmResponse { text, finish_reason: candidate.finish_reason })
}

#[async_trait]
impl Llm for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        debug!(
            model = %self.model,
            content_count = request.contents.len(),
            "generating content"
        );

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&to_wire(&request))
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "request failed");
                if e.is_timeout() {
                    ModelError::Timeout { after: self.timeout }
                } else {
                    ModelError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<error body unreadable: {e}>"),
            };
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(model = %self.model, %status, "API error");
            return Err(if status.as_u16() == 429 {
                ModelError::QuotaExceeded(detail)
            } else {
                ModelError::Api { status: status.as_u16(), message: detail }
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse response");
            ModelError::InvalidResponse(e.to_string())
        })?;
        from_wire(parsed)
    }
}
