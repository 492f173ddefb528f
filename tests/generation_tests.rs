use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vidbot::circuit_breaker::CircuitBreaker;
use vidbot::config::BreakerConfig;
use vidbot::generation::{GeminiClient, GenerationError, GenerationService, TextGenerator};

const MODEL: &str = "gemini-2.0-flash";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url("test-key", MODEL, Duration::from_secs(5), server.uri())
        .expect("client should build")
}

fn candidate_response(parts: &[&str]) -> serde_json::Value {
    let parts: Vec<_> = parts.iter().map(|text| json!({ "text": text })).collect();
    json!({
        "candidates": [{
            "content": { "parts": parts, "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_prompt_and_joins_parts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{MODEL}:generateContent")))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_json(json!({
            "contents": [{ "parts": [{ "text": "Say hi" }] }]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(candidate_response(&["Hi ", "there!"])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let reply = client_for(&mock_server).generate("Say hi").await;
    assert_eq!(reply.expect("should generate"), "Hi there!");
}

#[tokio::test]
async fn test_generate_reports_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).generate("Say hi").await;
    match result {
        Err(GenerationError::Api { code, message }) => {
            assert_eq!(code, 400);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_reports_plain_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).generate("Say hi").await;
    match result {
        Err(GenerationError::Api { code, message }) => {
            assert_eq!(code, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_without_candidates_is_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).generate("Say hi").await;
    assert!(matches!(result, Err(GenerationError::EmptyResponse)));
}

#[tokio::test]
async fn test_request_failure_does_not_expose_api_key() {
    // Nothing listens on port 1, so the request fails before any response
    let client = GeminiClient::with_base_url(
        "SECRET-KEY-123",
        MODEL,
        Duration::from_secs(5),
        "http://127.0.0.1:1".to_string(),
    )
    .expect("client should build");

    let error = client.generate("Say hi").await.expect_err("request should fail");
    assert!(matches!(error, GenerationError::Http(_)));
    assert!(!error.to_string().contains("SECRET-KEY-123"), "{error}");
    assert!(!format!("{error:?}").contains("SECRET-KEY-123"));
}

#[tokio::test]
async fn test_api_key_is_not_in_query_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_response(&["ok"])))
        .mount(&mock_server)
        .await;

    client_for(&mock_server).generate("Say hi").await.expect("should generate");

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);
}

#[test]
fn test_empty_api_key_is_rejected() {
    let result = GeminiClient::new("", MODEL, Duration::from_secs(5));
    assert!(matches!(result, Err(GenerationError::MissingApiKey)));
}

#[tokio::test]
async fn test_service_opens_breaker_after_repeated_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "internal" }
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let breaker = CircuitBreaker::new(BreakerConfig {
        failure_threshold: 2,
        reset_after: Duration::from_secs(60),
    });
    let generator: Arc<dyn TextGenerator> = Arc::new(client_for(&mock_server));
    let service = GenerationService::new(Some(generator), breaker, Duration::from_secs(5));

    assert!(matches!(service.reply("one").await, Err(GenerationError::Api { .. })));
    assert!(matches!(service.reply("two").await, Err(GenerationError::Api { .. })));

    // Third call never reaches the server
    assert!(matches!(service.reply("three").await, Err(GenerationError::CircuitOpen)));
}
