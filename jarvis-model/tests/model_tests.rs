use std::sync::Arc;
use std::time::Duration;

use jarvis_model::{Content, GenerationConfig, Llm, LlmRequest, MockLlm, ModelError, Role};

#[cfg(feature = "gemini")]
#[tokio::test]
async fn test_gemini_model_creation() {
    use jarvis_model::GeminiModel;

    let model = GeminiModel::new("test-api-key", "gemini-2.5-flash").unwrap();
    assert_eq!(model.name(), "gemini-2.5-flash");
    assert!(matches!(GeminiModel::new("key", " "), Err(ModelError::Config(_))));
}

#[tokio::test]
async fn test_llm_request_creation() {
    let request = LlmRequest::new(vec![Content::user("Hello")])
        .with_system_instruction("Be brief.")
        .with_config(GenerationConfig { max_output_tokens: Some(64), ..Default::default() });

    assert_eq!(request.contents.len(), 1);
    assert_eq!(request.contents[0].role, Role::User);
    assert_eq!(request.last_user_text(), Some("Hello"));
    assert_eq!(request.config.unwrap().max_output_tokens, Some(64));
}

#[tokio::test]
async fn test_mock_records_requests_across_tasks() {
    let llm: Arc<dyn Llm> = Arc::new(MockLlm::new("mock").with_delay(Duration::from_millis(1)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let llm = Arc::clone(&llm);
            let request = LlmRequest::new(vec![Content::user(format!("q{i}"))]);
            tokio::spawn(async move { llm.generate(request).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().text, "OK");
    }
}

#[tokio::test]
async fn test_mock_failure_is_an_api_error() {
    let llm = MockLlm::new("mock").with_failure("quota");
    let err = llm.generate(LlmRequest::new(vec![Content::user("hi")])).await.unwrap_err();
    assert!(err.to_string().contains("500"));
    assert_eq!(llm.requests().len(), 1);
}
