//! Prompt construction and the model call.
//!
//! The domain restriction lives entirely in the prompt: the model is told to
//! answer only from the supplied context and to reply with a fixed refusal
//! otherwise. Nothing checks the reply against the context, so
//! [`Answer::refused`] reflects what the model said, not what it should have
//! said.

use std::sync::Arc;
use std::time::Duration;

use jarvis_memory::ConversationTurn;
use jarvis_model::{Content, GenerationConfig, Llm, LlmRequest, ModelError};
use jarvis_rag::RetrievedChunk;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{AssistantConfig, DEFAULT_REQUEST_TIMEOUT};

/// Note placed in the context block when retrieval produced nothing.
pub const NO_CONTEXT_NOTE: &str = "No relevant context found.";

/// A completed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The reply shown to the user.
    pub text: String,
    /// Ids of the context chunks supplied to the model, in retrieval order.
    /// Empty for refusals.
    pub used_chunks: Vec<String>,
    /// Whether the reply is the canned refusal.
    pub refused: bool,
}

/// Renders the system instruction and user message for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    assistant_name: String,
    subject: String,
}

impl PromptTemplate {
    /// A template for `assistant_name` answering questions about `subject`.
    pub fn new(assistant_name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self { assistant_name: assistant_name.into(), subject: subject.into() }
    }

    /// The person the assistant answers about.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The canned out-of-domain reply.
    pub fn refusal(&self) -> String {
        let subject = &self.subject;
        format!(
            "I'm only trained to answer questions about {subject}. \
             Please ask something related to {subject}."
        )
    }

    /// Instructions framing every turn.
    pub fn system_instruction(&self) -> String {
        format!(
            "You are {name}, a personal assistant chatbot designed to answer questions \
             about {subject}.\n\
             \n\
             You should:\n\
             - Politely respond to casual greetings (e.g., \"hey\", \"how are you?\"), \
             even when no context is provided.\n\
             - Answer questions about {subject} using only the provided context.\n\
             - Decline questions that are not related to {subject} or to you by replying \
             exactly:\n\
             \x20 \"{refusal}\"\n\
             \n\
             Never make up answers, and do not speculate. If the context does not contain \
             the answer, say you don't know.",
            name = self.assistant_name,
            subject = self.subject,
            refusal = self.refusal(),
        )
    }

    /// The current user message: numbered context block, then the question.
    pub fn user_message(&self, question: &str, context: &[RetrievedChunk]) -> String {
        let mut message = String::from("Context:\n");
        if context.is_empty() {
            message.push_str(NO_CONTEXT_NOTE);
            message.push('\n');
        } else {
            for (i, chunk) in context.iter().enumerate() {
                message.push_str(&format!("[{}] {}\n", i + 1, chunk.text.trim()));
            }
        }
        message.push_str("\nQuestion:\n");
        message.push_str(question);
        message.push_str("\n\nAnswer:");
        message
    }

    /// Whether `reply` contains the refusal's first sentence, ignoring case
    /// and apostrophe style.
    pub fn is_refusal(&self, reply: &str) -> bool {
        let marker =
            normalize(&format!("I'm only trained to answer questions about {}", self.subject));
        normalize(reply).contains(&marker)
    }

    /// Instruction for rewriting a follow-up into a standalone question.
    pub fn condense_instruction(&self) -> String {
        "Given the following conversation and a follow up question, rephrase the follow up \
         question to be a standalone question, in its original language. Reply with the \
         standalone question only."
            .to_string()
    }

    /// The conversation so far and the follow-up, as one message.
    pub fn condense_message(&self, question: &str, history: &[ConversationTurn]) -> String {
        let mut message = String::from("Chat History:\n");
        for turn in history {
            message.push_str(&format!("Human: {}\nAssistant: {}\n", turn.question, turn.answer));
        }
        message.push_str("Follow Up Input: ");
        message.push_str(question);
        message.push_str("\nStandalone question:");
        message
    }
}

fn normalize(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'").to_lowercase()
}

/// Turns a question, its context and the conversation so far into an [`Answer`].
pub struct Generator {
    llm: Arc<dyn Llm>,
    template: PromptTemplate,
    timeout: Duration,
    generation_config: Option<GenerationConfig>,
}

impl Generator {
    /// Create a generator with the default timeout.
    pub fn new(llm: Arc<dyn Llm>, template: PromptTemplate) -> Self {
        Self { llm, template, timeout: DEFAULT_REQUEST_TIMEOUT, generation_config: None }
    }

    /// Create a generator using the persona and timeout from `config`.
    pub fn from_config(llm: Arc<dyn Llm>, config: &AssistantConfig) -> Self {
        Self::new(llm, PromptTemplate::new(&config.assistant_name, &config.subject))
            .with_timeout(config.request_timeout)
    }

    /// Bound each model call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pass sampling parameters with every request.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// The prompt template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// The underlying model.
    pub fn llm(&self) -> &Arc<dyn Llm> {
        &self.llm
    }

    /// Build the model request: history as alternating user/model contents,
    /// then the current message.
    pub fn build_request(
        &self,
        question: &str,
        context: &[RetrievedChunk],
        history: &[ConversationTurn],
    ) -> LlmRequest {
        let mut contents = Vec::with_capacity(history.len() * 2 + 1);
        for turn in history {
            contents.push(Content::user(&turn.question));
            contents.push(Content::model(&turn.answer));
        }
        contents.push(Content::user(self.template.user_message(question, context)));

        let request =
            LlmRequest::new(contents).with_system_instruction(self.template.system_instruction());
        match &self.generation_config {
            Some(config) => request.with_config(config.clone()),
            None => request,
        }
    }

    /// Ask the model. Does not retry.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Timeout`] when the call outlives the configured
    /// timeout, or whatever error the model reports.
    pub async fn answer(
        &self,
        question: &str,
        context: &[RetrievedChunk],
        history: &[ConversationTurn],
    ) -> Result<Answer, ModelError> {
        let request = self.build_request(question, context, history);
        debug!(
            model = self.llm.name(),
            context_count = context.len(),
            history_turns = history.len(),
            "calling model"
        );

        let text = self.call(request).await?;
        let refused = self.template.is_refusal(&text);
        let used_chunks =
            if refused { Vec::new() } else { context.iter().map(|c| c.chunk_id.clone()).collect() };
        Ok(Answer { text, used_chunks, refused })
    }

    /// Rewrite a follow-up into a question that stands without `history`.
    ///
    /// Returns `question` unchanged when there is no history, or when the
    /// model replies with nothing usable. Does not retry.
    ///
    /// # Errors
    ///
    /// Same as [`answer`](Self::answer).
    pub async fn condense_question(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String, ModelError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let request =
            LlmRequest::new(vec![Content::user(self.template.condense_message(question, history))])
                .with_system_instruction(self.template.condense_instruction());
        debug!(model = self.llm.name(), history_turns = history.len(), "condensing question");

        let standalone = self.call(request).await?;
        if standalone.is_empty() {
            return Ok(question.to_string());
        }
        debug!(%standalone, "condensed follow-up");
        Ok(standalone)
    }

    async fn call(&self, request: LlmRequest) -> Result<String, ModelError> {
        let response = tokio::time::timeout(self.timeout, self.llm.generate(request))
            .await
            .map_err(|_| {
                error!(model = self.llm.name(), timeout = ?self.timeout, "model call timed out");
                ModelError::Timeout { after: self.timeout }
            })?
            .inspect_err(|e| error!(model = self.llm.name(), error = %e, "model call failed"))?;
        Ok(response.text.trim().to_string())
    }

    /// The canned refusal as an [`Answer`], without calling the model.
    pub fn refusal_answer(&self) -> Answer {
        Answer { text: self.template.refusal(), used_chunks: Vec::new(), refused: true }
    }
}
