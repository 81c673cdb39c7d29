//! Question-answering orchestrator.
//!
//! The [`Assistant`] ties a [`Retriever`], a [`Generator`] and a
//! [`ConversationMemory`] together behind two operations, [`ask`](Assistant::ask)
//! and [`reset`](Assistant::reset).
//!
//! # Example
//!
//! ```rust,ignore
//! use jarvis_assistant::{Assistant, AssistantConfig, Generator};
//!
//! let config = AssistantConfig::default();
//! let assistant = Arc::new(
//!     Assistant::builder()
//!         .retriever(Arc::new(retriever))
//!         .generator(Generator::from_config(llm, &config))
//!         .config(config)
//!         .build()?,
//! );
//! let answer = assistant.ask("When was Ankit born?").await?;
//! ```

use std::sync::Arc;

use jarvis_memory::{ConversationMemory, ConversationTurn};
use jarvis_rag::{RagConfig, RagError, RetrievedChunk, Retriever};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::{AssistantConfig, NoContextPolicy};
use crate::error::{AssistantError, Result};
use crate::generator::{Answer, Generator};

/// A single-session question-answering assistant.
///
/// Build once at startup and share as `Arc<Assistant>`. Concurrent
/// [`ask`](Self::ask) calls are serialized on the conversation memory, so each
/// call sees the history left by the previous one and no turn is lost.
pub struct Assistant {
    retriever: Arc<Retriever>,
    generator: Generator,
    config: AssistantConfig,
    top_k: usize,
    memory: Mutex<ConversationMemory>,
}

impl Assistant {
    /// Create a new [`AssistantBuilder`].
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::default()
    }

    /// The assistant configuration.
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Number of chunks retrieved per question.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The retriever, e.g. for swapping in a rebuilt index.
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Answer `question` and record the exchange.
    ///
    /// History read, retrieval, generation and the memory append form one
    /// critical section. Retrieval and each model call are bounded by
    /// [`AssistantConfig::request_timeout`], so the section cannot hold the
    /// memory lock indefinitely. On failure the memory is left untouched.
    ///
    /// With [`AssistantConfig::condense_follow_ups`] set and a non-empty
    /// history, the question is first rewritten into a standalone one and
    /// that rewrite is used as the retrieval query. The model still sees the
    /// original question.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::InvalidArgument`] for a blank question
    /// - [`AssistantError::Retrieval`] if embedding or search fails or times out
    /// - [`AssistantError::Generation`] if the model fails or times out
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::InvalidArgument("question must not be empty".into()));
        }

        let mut memory = self.memory.lock().await;
        let history = memory.history();

        let query = if self.config.condense_follow_ups {
            self.generator.condense_question(question, &history).await?
        } else {
            question.to_string()
        };

        let context = match self.retrieve(&query).await {
            Ok(chunks) => chunks,
            Err(RagError::RetrievalError(reason)) => match self.config.no_context_policy {
                NoContextPolicy::ProceedWithoutContext => {
                    warn!(%reason, "no context available, answering without it");
                    Vec::new()
                }
                NoContextPolicy::Refuse => {
                    warn!(%reason, "no context available, refusing");
                    let answer = self.generator.refusal_answer();
                    memory.append(ConversationTurn::new(question, &answer.text));
                    return Ok(answer);
                }
            },
            Err(e) => {
                error!(error = %e, "retrieval failed");
                return Err(e.into());
            }
        };

        let answer = self.generator.answer(question, &context, &history).await?;
        memory.append(ConversationTurn::new(question, &answer.text));

        info!(
            question_len = question.len(),
            condensed = query != question,
            context_count = context.len(),
            refused = answer.refused,
            history_turns = memory.len(),
            "answer generated"
        );
        Ok(answer)
    }

    async fn retrieve(&self, query: &str) -> std::result::Result<Vec<RetrievedChunk>, RagError> {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, self.retriever.retrieve(query, self.top_k))
            .await
            .unwrap_or_else(|_| {
                let provider = self.retriever.embedder().model_name().to_string();
                error!(%provider, ?timeout, "retrieval timed out");
                Err(RagError::EmbeddingError {
                    provider,
                    message: format!("query embedding timed out after {timeout:?}"),
                })
            })
    }

    /// Start a new conversation. Idempotent; always returns `true`.
    pub async fn reset(&self) -> bool {
        let cleared = self.memory.lock().await.clear();
        info!("conversation reset");
        cleared
    }

    /// Snapshot of the conversation, oldest first.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.memory.lock().await.history()
    }
}

/// Builder for [`Assistant`].
///
/// `retriever` and `generator` are required; `config` defaults to
/// [`AssistantConfig::default`] and `top_k` to [`RagConfig`]'s default.
#[derive(Default)]
pub struct AssistantBuilder {
    retriever: Option<Arc<Retriever>>,
    generator: Option<Generator>,
    config: Option<AssistantConfig>,
    top_k: Option<usize>,
}

impl AssistantBuilder {
    /// Set the retriever.
    pub fn retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the generator.
    pub fn generator(mut self, generator: Generator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set how many chunks to retrieve per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Build the [`Assistant`].
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if a required field is missing,
    /// `top_k` is zero or the history bound is zero.
    pub fn build(self) -> Result<Assistant> {
        let retriever = self
            .retriever
            .ok_or_else(|| AssistantError::Config("retriever is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| AssistantError::Config("generator is required".to_string()))?;
        let config = self.config.unwrap_or_default();
        let top_k = self.top_k.unwrap_or_else(|| RagConfig::default().top_k);
        if top_k == 0 {
            return Err(AssistantError::Config("top_k must be greater than zero".to_string()));
        }

        let memory = match config.max_history_turns {
            Some(max) => ConversationMemory::with_max_turns(max)?,
            None => ConversationMemory::new(),
        };

        Ok(Assistant { retriever, generator, config, top_k, memory: Mutex::new(memory) })
    }
}
