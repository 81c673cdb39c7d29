//! Scripted model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest, LlmResponse};

type Responder = Box<dyn Fn(&LlmRequest) -> String + Send + Sync>;

enum Scripted {
    Reply(String),
    Failure(String),
}

/// A [`Llm`] that replays scripted replies and records every request.
///
/// Queued replies are consumed first; once the queue is empty the responder
/// (by default a fixed acknowledgement) produces the answer.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_model::MockLlm;
///
/// let llm = MockLlm::new("mock").with_reply("Ankit was born in 1995.");
/// ```
pub struct MockLlm {
    name: String,
    queue: Mutex<VecDeque<Scripted>>,
    responder: Responder,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    /// Create a mock that answers "OK" to everything.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: Mutex::new(VecDeque::new()),
            responder: Box::new(|_| "OK".to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Scripted::Reply(text.into()));
        self
    }

    /// Queue a failure, surfaced as [`ModelError::Api`] with status 500.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Failure(message.into()));
        self
    }

    /// Compute replies from the request once the queue is drained.
    pub fn with_responder(
        mut self,
        responder: impl Fn(&LlmRequest) -> String + Send + Sync + 'static,
    ) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// Sleep before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn push(&self, item: Scripted) {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).push_back(item);
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        match scripted {
            Some(Scripted::Reply(text)) => Ok(LlmResponse::text(text)),
            Some(Scripted::Failure(message)) => Err(ModelError::Api { status: 500, message }),
            None => Ok(LlmResponse::text((self.responder)(&request))),
        }
    }
}
