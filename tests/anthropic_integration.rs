//! Integration tests for the Anthropic client against a mock Messages API.
//!
//! Each test spins up an Axum server on a random port and points the real
//! `AnthropicClient` at it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use translate_bot::error::LlmError;
use translate_bot::llm::{
    AnthropicClient, AnthropicConfig, ContentBlock, Message, TranslationProvider,
    TranslationRequest,
};

/// Canned response plus a log of what the client sent.
struct MockApi {
    status: StatusCode,
    body: String,
    delay: Duration,
    seen: Mutex<Vec<(HeaderMap, Value)>>,
}

async fn messages(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    api.seen.lock().unwrap().push((headers, body));
    tokio::time::sleep(api.delay).await;
    (api.status, api.body.clone())
}

async fn start_api(status: StatusCode, body: impl Into<String>, delay: Duration) -> (String, Arc<MockApi>) {
    let api = Arc::new(MockApi {
        status,
        body: body.into(),
        delay,
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(Arc::clone(&api));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), api)
}

fn client(base_url: &str, timeout: Duration) -> AnthropicClient {
    let mut config = AnthropicConfig::new(SecretString::from("sk-ant-test"));
    config.base_url = base_url.to_string();
    config.timeout = timeout;
    AnthropicClient::new(config).unwrap()
}

fn request(text: &str) -> TranslationRequest {
    TranslationRequest {
        model: "claude-3-haiku-20240307".into(),
        system: "Translate to Hebrew".into(),
        messages: vec![Message::user_text(text)],
        max_tokens: 1024,
        stream: false,
        temperature: None,
    }
}

#[tokio::test]
async fn successful_reply_is_decoded() {
    let body = json!({
        "id": "msg_013Zva2CMHLNnXjNJJKqJ2EF",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": "{\"lang\": \"he\", \"text\": \"שלום\"}"}],
        "model": "claude-3-haiku-20240307",
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 31, "output_tokens": 12}
    });
    let (url, api) = start_api(StatusCode::OK, body.to_string(), Duration::ZERO).await;

    let reply = client(&url, Duration::from_secs(5))
        .create_message(&request("Hello"))
        .await
        .unwrap();

    assert_eq!(reply.id, "msg_013Zva2CMHLNnXjNJJKqJ2EF");
    assert_eq!(
        reply.content,
        vec![ContentBlock::text("{\"lang\": \"he\", \"text\": \"שלום\"}")]
    );
    assert_eq!(reply.usage.input_tokens, 31);

    let seen = api.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (headers, sent) = &seen[0];
    assert_eq!(headers["x-api-key"], "sk-ant-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(sent["model"], "claude-3-haiku-20240307");
    assert_eq!(sent["system"], "Translate to Hebrew");
    assert_eq!(sent["max_tokens"], 1024);
    assert_eq!(sent["stream"], false);
    assert_eq!(sent["messages"][0]["role"], "user");
    assert_eq!(sent["messages"][0]["content"][0]["type"], "text");
    assert_eq!(sent["messages"][0]["content"][0]["text"], "Hello");
}

#[tokio::test]
async fn error_envelope_maps_to_api_error() {
    let body = json!({
        "type": "error",
        "error": {"type": "rate_limit_error", "message": "Number of requests has exceeded your rate limit"}
    });
    let (url, _api) = start_api(StatusCode::TOO_MANY_REQUESTS, body.to_string(), Duration::ZERO).await;

    let err = client(&url, Duration::from_secs(5))
        .create_message(&request("Hello"))
        .await
        .unwrap_err();

    match err {
        LlmError::Api {
            status, error_type, ..
        } => {
            assert_eq!(status, 429);
            assert_eq!(error_type, "rate_limit_error");
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept() {
    let (url, _api) = start_api(StatusCode::BAD_GATEWAY, "upstream connect error", Duration::ZERO).await;

    let err = client(&url, Duration::from_secs(5))
        .create_message(&request("Hello"))
        .await
        .unwrap_err();

    match err {
        LlmError::Api {
            status,
            error_type,
            message,
            ..
        } => {
            assert_eq!(status, 502);
            assert_eq!(error_type, "unknown");
            assert_eq!(message, "upstream connect error");
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_success_body_is_invalid_response() {
    let (url, _api) = start_api(StatusCode::OK, "not json at all", Duration::ZERO).await;

    let err = client(&url, Duration::from_secs(5))
        .create_message(&request("Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::InvalidResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn slow_provider_times_out() {
    let (url, _api) = start_api(StatusCode::OK, "{}", Duration::from_secs(3)).await;

    let err = client(&url, Duration::from_millis(200))
        .create_message(&request("Hello"))
        .await
        .unwrap_err();

    match err {
        LlmError::RequestFailed { reason, .. } => assert!(reason.contains("timed out"), "{reason}"),
        other => panic!("Expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_provider_is_request_failure() {
    // Grab a free port, then close it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), Duration::from_secs(5))
        .create_message(&request("Hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::RequestFailed { .. }), "got {err:?}");
}
