use std::sync::Arc;
use std::time::Duration;

use parley::error::ProviderError;
use parley::provider::{CompletionRequest, ModelProvider, OpenAiProvider};
use parley::session::{run_session, SessionOptions};
use parley::types::{FinishReason, GenerationSettings};
use parley::util::retry::RetryPolicy;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn test_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

fn provider(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new("test-key".to_string(), Some(format!("{}/", server.uri())))
        .with_retry_policy(test_retry_policy(1))
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4.1-mini".to_string(),
        instructions: "You are a geologist.".to_string(),
        input: "Conversation so far:\n\nUser: What is basalt?".to_string(),
        settings: GenerationSettings {
            max_tokens: None,
            temperature: Some(0.3),
        },
    }
}

fn chat_body(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
    })
}

#[tokio::test]
async fn chat_completion_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1-mini",
            "temperature": 0.3,
            "messages": [
                {"role": "system", "content": "You are a geologist."},
                {"role": "user", "content": "Conversation so far:\n\nUser: What is basalt?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("A volcanic rock.")))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .complete(&request())
        .await
        .expect("completion should succeed");

    assert_eq!(response.text, "A volcanic rock.");
    assert_eq!(response.usage.total_tokens, 19);
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server)
        .with_retry_policy(test_retry_policy(3))
        .complete(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Authentication(_)), "{err:?}");
}

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .expect(3)
        .mount(&server)
        .await;

    let err = provider(&server)
        .with_retry_policy(test_retry_policy(3))
        .complete(&request())
        .await
        .unwrap_err();

    assert!(
        matches!(err, ProviderError::Api { status: 500, .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = provider(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = provider(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("late"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .with_timeout(Duration::from_millis(50))
        .complete(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Timeout(_)), "{err:?}");
}

#[tokio::test]
async fn full_session_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Noted.")))
        .expect(3)
        .mount(&server)
        .await;

    let config = common::run_config("Learn geology", 1);
    let sink = common::MemorySink::default();
    let report = run_session(
        &config,
        Arc::new(provider(&server)),
        &sink,
        SessionOptions::default(),
    )
    .await
    .unwrap();

    assert!(report.is_success(), "{:?}", report.error);
    let artifacts = sink.artifacts();
    assert_eq!(artifacts.len(), 2);
    assert_eq!(artifacts[0].1, "User: Noted.\n\nExpert: Noted.");
    assert!(artifacts[1].1.ends_with("Noted.\n"));
}
