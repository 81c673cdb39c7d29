use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jarvis_assistant::{
    Assistant, AssistantConfig, AssistantError, Generator, NO_CONTEXT_NOTE, NoContextPolicy,
    PromptTemplate,
};
use jarvis_model::{LlmRequest, MockLlm, ModelError};
use jarvis_rag::{
    DistanceMetric, Document, Embedder, EmbeddingProvider, FlatIndex, HashEmbeddingProvider,
    IndexBuilder, IndexSpec, RagError, RecursiveChunker, Retriever,
};

const REFUSAL: &str =
    "I'm only trained to answer questions about Ankit. Please ask something related to Ankit.";

fn embedder() -> Embedder {
    Embedder::new(Arc::new(HashEmbeddingProvider::default()))
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("bio-1", "Ankit was born in 1995."),
        Document::new("bio-2", "Ankit works as an engineer."),
    ]
}

async fn corpus_index() -> FlatIndex {
    IndexBuilder::new(Arc::new(RecursiveChunker::new(50, 0)), embedder(), DistanceMetric::Cosine)
        .build(&corpus())
        .await
        .unwrap()
}

async fn corpus_retriever() -> Arc<Retriever> {
    let retriever = Retriever::new(embedder(), Arc::new(corpus_index().await)).unwrap();
    Arc::new(retriever.with_score_threshold(Some(0.3)))
}

fn empty_retriever() -> Arc<Retriever> {
    let spec = IndexSpec::new(384, DistanceMetric::Cosine, "hash-384");
    Arc::new(Retriever::new(embedder(), Arc::new(FlatIndex::empty(spec))).unwrap())
}

fn question_of(request: &LlmRequest) -> String {
    let message = request.last_user_text().unwrap_or_default();
    message
        .split("Question:\n")
        .nth(1)
        .and_then(|rest| rest.split("\n\nAnswer:").next())
        .unwrap_or_default()
        .to_string()
}

/// Replies like a model that follows the prompt policy.
fn compliant_reply(request: &LlmRequest) -> String {
    let message = request.last_user_text().unwrap_or_default().to_lowercase();
    let question = question_of(request).to_lowercase();
    if question.starts_with("hello") {
        "Hello! I'm Jarvis. Ask me anything about Ankit.".to_string()
    } else if question.contains("born") && message.contains("1995") {
        "Ankit was born in 1995.".to_string()
    } else {
        REFUSAL.to_string()
    }
}

fn compliant_model() -> MockLlm {
    MockLlm::new("compliant").with_responder(compliant_reply)
}

fn assistant(
    retriever: Arc<Retriever>,
    llm: Arc<MockLlm>,
    config: AssistantConfig,
    top_k: usize,
) -> Assistant {
    Assistant::builder()
        .retriever(retriever)
        .generator(Generator::from_config(llm, &config))
        .config(config)
        .top_k(top_k)
        .build()
        .unwrap()
}

#[tokio::test]
async fn answers_from_the_matching_chunk_only() {
    let llm = Arc::new(compliant_model());
    let assistant = assistant(corpus_retriever().await, llm.clone(), AssistantConfig::default(), 1);

    let answer = assistant.ask("When was Ankit born?").await.unwrap();

    assert!(answer.text.contains("1995"));
    assert!(!answer.text.contains("engineer"));
    assert!(!answer.refused);
    assert_eq!(answer.used_chunks, vec!["bio-1#00000".to_string()]);

    let sent = llm.requests();
    let message = sent[0].last_user_text().unwrap();
    assert!(message.contains("Ankit was born in 1995."));
    assert!(!message.contains("engineer"));
}

#[tokio::test]
async fn unrelated_question_is_refused() {
    let llm = Arc::new(compliant_model());
    let assistant = assistant(corpus_retriever().await, llm.clone(), AssistantConfig::default(), 4);

    let answer = assistant.ask("What's the weather?").await.unwrap();

    assert!(answer.refused);
    assert_eq!(answer.text, REFUSAL);
    assert!(answer.used_chunks.is_empty());
    assert!(llm.requests()[0].last_user_text().unwrap().contains(NO_CONTEXT_NOTE));
}

#[tokio::test]
async fn greeting_without_context_gets_a_friendly_reply() {
    let llm = Arc::new(compliant_model());
    let assistant = assistant(corpus_retriever().await, llm, AssistantConfig::default(), 4);

    let answer = assistant.ask("hello").await.unwrap();

    assert!(!answer.refused);
    assert!(answer.text.starts_with("Hello"));
    assert!(answer.used_chunks.is_empty());
}

#[tokio::test]
async fn blank_question_is_rejected_before_any_call() {
    let llm = Arc::new(compliant_model());
    let assistant = assistant(corpus_retriever().await, llm.clone(), AssistantConfig::default(), 4);

    let err = assistant.ask("   ").await.unwrap_err();

    assert!(matches!(err, AssistantError::InvalidArgument(_)));
    assert_eq!(llm.call_count(), 0);
    assert!(assistant.history().await.is_empty());
}

#[tokio::test]
async fn empty_index_proceeds_without_context_by_default() {
    let llm = Arc::new(compliant_model());
    let assistant = assistant(empty_retriever(), llm.clone(), AssistantConfig::default(), 4);

    let answer = assistant.ask("hello").await.unwrap();

    assert!(!answer.refused);
    assert_eq!(llm.call_count(), 1);
    assert!(llm.requests()[0].last_user_text().unwrap().contains(NO_CONTEXT_NOTE));
}

#[tokio::test]
async fn empty_index_can_refuse_without_calling_the_model() {
    let llm = Arc::new(compliant_model());
    let config =
        AssistantConfig::builder().no_context_policy(NoContextPolicy::Refuse).build().unwrap();
    let assistant = assistant(empty_retriever(), llm.clone(), config, 4);

    let answer = assistant.ask("When was Ankit born?").await.unwrap();

    assert!(answer.refused);
    assert_eq!(answer.text, PromptTemplate::new("Jarvis", "Ankit").refusal());
    assert_eq!(llm.call_count(), 0);
    assert_eq!(assistant.history().await.len(), 1);
}

#[tokio::test]
async fn swapped_index_is_used_by_later_questions() {
    let llm = Arc::new(compliant_model());
    let config =
        AssistantConfig::builder().no_context_policy(NoContextPolicy::Refuse).build().unwrap();
    let assistant = assistant(empty_retriever(), llm, config, 1);

    assert!(assistant.ask("When was Ankit born?").await.unwrap().refused);

    assistant.retriever().replace_index(Arc::new(corpus_index().await)).await.unwrap();
    let answer = assistant.ask("When was Ankit born?").await.unwrap();
    assert!(answer.text.contains("1995"));
}

#[tokio::test]
async fn persisted_index_answers_like_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    corpus_index().await.persist(&path).unwrap();

    let index = FlatIndex::open(&path, 384, "hash-384").unwrap();
    let retriever = Arc::new(Retriever::new(embedder(), Arc::new(index)).unwrap());
    let assistant =
        assistant(retriever, Arc::new(compliant_model()), AssistantConfig::default(), 1);

    let answer = assistant.ask("When was Ankit born?").await.unwrap();
    assert_eq!(answer.used_chunks, vec!["bio-1#00000".to_string()]);
}

#[tokio::test]
async fn failed_generation_leaves_memory_untouched() {
    let llm = Arc::new(MockLlm::new("flaky").with_failure("backend unavailable"));
    let assistant = assistant(corpus_retriever().await, llm.clone(), AssistantConfig::default(), 4);

    let err = assistant.ask("When was Ankit born?").await.unwrap_err();
    assert!(matches!(err, AssistantError::Generation(ModelError::Api { status: 500, .. })));
    assert!(assistant.history().await.is_empty());

    // No retry happened; the next call reaches the responder.
    assistant.ask("When was Ankit born?").await.unwrap();
    assert_eq!(llm.call_count(), 2);
    assert_eq!(assistant.history().await.len(), 1);
}

#[tokio::test]
async fn slow_model_surfaces_a_timeout() {
    let llm = Arc::new(MockLlm::new("slow").with_delay(Duration::from_millis(300)));
    let config =
        AssistantConfig::builder().request_timeout(Duration::from_millis(20)).build().unwrap();
    let assistant = assistant(corpus_retriever().await, llm, config, 4);

    let err = assistant.ask("When was Ankit born?").await.unwrap_err();
    assert!(matches!(
        err,
        AssistantError::Generation(ModelError::Timeout { after })
            if after == Duration::from_millis(20)
    ));
    assert!(assistant.history().await.is_empty());
}

#[tokio::test]
async fn reset_clears_history() {
    let llm = Arc::new(compliant_model());
    let assistant = assistant(corpus_retriever().await, llm, AssistantConfig::default(), 4);
    assistant.ask("hello").await.unwrap();
    assistant.ask("When was Ankit born?").await.unwrap();
    assert_eq!(assistant.history().await.len(), 2);

    assert!(assistant.reset().await);
    assert!(assistant.history().await.is_empty());
    assert!(assistant.reset().await);
}

#[tokio::test]
async fn history_is_sent_with_each_question_and_bounded() {
    let llm = Arc::new(compliant_model());
    let config = AssistantConfig::builder().max_history_turns(2).build().unwrap();
    let assistant = assistant(corpus_retriever().await, llm.clone(), config, 4);

    for _ in 0..4 {
        assistant.ask("When was Ankit born?").await.unwrap();
    }

    let lengths: Vec<usize> = llm.requests().iter().map(|r| r.contents.len()).collect();
    assert_eq!(lengths, vec![1, 3, 5, 5]);
    assert_eq!(assistant.history().await.len(), 2);
}

#[tokio::test]
async fn zero_history_bound_is_a_config_error() {
    let mut config = AssistantConfig::default();
    config.max_history_turns = Some(0);
    let result = Assistant::builder()
        .retriever(empty_retriever())
        .generator(Generator::from_config(Arc::new(MockLlm::new("m")), &config))
        .config(config)
        .build();
    assert!(matches!(result, Err(AssistantError::Config(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_asks_serialize_on_memory() {
    const CALLS: usize = 16;
    let llm = Arc::new(
        MockLlm::new("echo")
            .with_delay(Duration::from_millis(5))
            .with_responder(|request| format!("echo: {}", question_of(request))),
    );
    let assistant =
        Arc::new(assistant(corpus_retriever().await, llm.clone(), AssistantConfig::default(), 2));

    let tasks = (0..CALLS).map(|i| {
        let assistant = Arc::clone(&assistant);
        tokio::spawn(async move { assistant.ask(&format!("question {i}")).await })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let history = assistant.history().await;
    assert_eq!(history.len(), CALLS);
    for turn in &history {
        assert_eq!(turn.answer, format!("echo: {}", turn.question));
    }

    // Each call saw every earlier turn, so no two calls overlapped.
    let lengths: Vec<usize> = llm.requests().iter().map(|r| r.contents.len()).collect();
    let expected: Vec<usize> = (0..CALLS).map(|i| 2 * i + 1).collect();
    assert_eq!(lengths, expected);
}

/// Embeds like the default hash embedder, after a fixed delay.
struct SlowEmbeddingProvider {
    inner: HashEmbeddingProvider,
    delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowEmbeddingProvider {
    async fn embed(&self, text: &str) -> jarvis_rag::Result<Vec<f32>> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hung_embedding_is_bounded_and_does_not_block_reset() {
    let slow = SlowEmbeddingProvider {
        inner: HashEmbeddingProvider::default(),
        delay: Duration::from_secs(3),
    };
    let retriever = Retriever::new(Embedder::new(Arc::new(slow)), Arc::new(corpus_index().await));
    let llm = Arc::new(compliant_model());
    let config =
        AssistantConfig::builder().request_timeout(Duration::from_millis(100)).build().unwrap();
    let assistant = Arc::new(assistant(Arc::new(retriever.unwrap()), llm.clone(), config, 1));

    let started = Instant::now();
    let asking = {
        let assistant = Arc::clone(&assistant);
        tokio::spawn(async move { assistant.ask("When was Ankit born?").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let reset_started = Instant::now();
    assert!(assistant.reset().await);
    assert!(reset_started.elapsed() < Duration::from_secs(1));

    let err = asking.await.unwrap().unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(matches!(err, AssistantError::Retrieval(RagError::EmbeddingError { .. })));
    assert_eq!(llm.call_count(), 0);
    assert!(assistant.history().await.is_empty());
}

/// Embeds with the default hash embedder and records every text it sees.
#[derive(Default)]
struct RecordingEmbeddingProvider {
    inner: HashEmbeddingProvider,
    seen: Mutex<Vec<String>>,
}

impl RecordingEmbeddingProvider {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for RecordingEmbeddingProvider {
    async fn embed(&self, text: &str) -> jarvis_rag::Result<Vec<f32>> {
        self.seen.lock().unwrap().push(text.to_string());
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Rewrites condense requests to a fixed standalone question and otherwise
/// behaves like [`compliant_model`].
fn condensing_model() -> MockLlm {
    MockLlm::new("condensing").with_responder(|request| {
        let instruction = request.system_instruction.as_deref().unwrap_or_default();
        if instruction.contains("standalone question") {
            "When was Ankit born?".to_string()
        } else {
            compliant_reply(request)
        }
    })
}

async fn recording_assistant(
    condense: bool,
) -> (Assistant, Arc<RecordingEmbeddingProvider>, Arc<MockLlm>) {
    let recorder = Arc::new(RecordingEmbeddingProvider::default());
    let retriever = Retriever::new(Embedder::new(recorder.clone()), Arc::new(corpus_index().await))
        .unwrap()
        .with_score_threshold(Some(0.3));
    let llm = Arc::new(condensing_model());
    let config = AssistantConfig::builder().condense_follow_ups(condense).build().unwrap();
    (assistant(Arc::new(retriever), llm.clone(), config, 1), recorder, llm)
}

#[tokio::test]
async fn follow_up_is_condensed_before_retrieval() {
    let (assistant, recorder, llm) = recording_assistant(true).await;

    assistant.ask("Tell me about Ankit").await.unwrap();
    let answer = assistant.ask("When was he born?").await.unwrap();

    // The first question has no history, so it is embedded as asked.
    assert_eq!(recorder.seen(), vec!["Tell me about Ankit", "When was Ankit born?"]);
    assert_eq!(answer.used_chunks, vec!["bio-1#00000".to_string()]);

    // answer, condense, answer; the answering call keeps the original wording.
    let sent = llm.requests();
    assert_eq!(sent.len(), 3);
    assert!(sent[1].last_user_text().unwrap().contains("Follow Up Input: When was he born?"));
    assert_eq!(question_of(&sent[2]), "When was he born?");

    let history = assistant.history().await;
    assert_eq!(history[1].question, "When was he born?");
}

#[tokio::test]
async fn follow_up_is_retrieved_verbatim_when_condensing_is_off() {
    let (assistant, recorder, llm) = recording_assistant(false).await;

    assistant.ask("Tell me about Ankit").await.unwrap();
    assistant.ask("When was he born?").await.unwrap();

    assert_eq!(recorder.seen(), vec!["Tell me about Ankit", "When was he born?"]);
    assert_eq!(llm.call_count(), 2);
}
