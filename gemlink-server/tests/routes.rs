//! In-process tests for the completions router.
//!
//! Verifies that the router:
//! - answers OPTIONS preflight with 204 and the CORS header set
//! - returns completions and error envelopes with CORS headers attached
//! - applies the configured error status policy

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use gemlink_core::Translator;
use gemlink_core::config::{ErrorStatusPolicy, SecretString};
use gemlink_core::providers::{
    ChatSession, GenerativeBackend, PromptFeedback, ProviderError, ProviderResult, TurnReply,
};
use gemlink_server::{CHAT_COMPLETIONS_PATH, router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Backend with a canned reply that remembers the credentials it saw.
struct StubBackend {
    reply: fn() -> ProviderResult<TurnReply>,
    credentials: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn send_turn(
        &self,
        credential: Option<&SecretString>,
        _session: &ChatSession,
        _prompt: &str,
    ) -> ProviderResult<TurnReply> {
        self.credentials
            .lock()
            .unwrap()
            .push(credential.map(|c| c.expose_secret().to_string()));
        (self.reply)()
    }
}

fn app_with(
    reply: fn() -> ProviderResult<TurnReply>,
    policy: ErrorStatusPolicy,
) -> (Router, Arc<StubBackend>) {
    let backend = Arc::new(StubBackend {
        reply,
        credentials: Mutex::new(Vec::new()),
    });
    let translator = Translator::new(backend.clone())
        .with_default_credential(Some(SecretString::new("env-key")))
        .with_error_status(policy);
    (router(Arc::new(translator)), backend)
}

fn app(reply: fn() -> ProviderResult<TurnReply>) -> Router {
    app_with(reply, ErrorStatusPolicy::Uniform).0
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(CHAT_COMPLETIONS_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn chat_body() -> String {
    json!({
        "model": "gemini-pro",
        "messages": [
            {"role": "user", "content": "Hi"},
            {"role": "assistant", "content": "Hello!"},
            {"role": "user", "content": "How are you?"}
        ]
    })
    .to_string()
}

fn assert_cors(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET,HEAD,POST,OPTIONS"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization"
    );
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_preflight_returns_204_with_cors_headers() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(CHAT_COMPLETIONS_PATH)
        .header(header::ORIGIN, "https://chat.example.com")
        .body(Body::from("this is not json at all"))
        .unwrap();

    let response = app(|| Ok(TurnReply::text("unused")))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors(&response);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_completion_success() {
    let response = app(|| Ok(TurnReply::text("I'm fine.")))
        .oneshot(post(chat_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let body = json_body(response).await;
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "gemini-pro");
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert_eq!(body["choices"][0]["message"]["content"], "I'm fine.");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert_eq!(body["usage"]["total_tokens"], 0);
}

#[tokio::test]
async fn test_bearer_token_overrides_default_key() {
    let (router, backend) = app_with(|| Ok(TurnReply::text("ok")), ErrorStatusPolicy::Uniform);

    let mut request = post(chat_body());
    request.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer abc123".parse().unwrap(),
    );
    router.clone().oneshot(request).await.unwrap();
    router.oneshot(post(chat_body())).await.unwrap();

    let seen = backend.credentials.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![Some("abc123".to_string()), Some("env-key".to_string())]
    );
}

#[tokio::test]
async fn test_blocked_prompt_returns_500_envelope() {
    let response = app(|| {
        Ok(TurnReply {
            text: String::new(),
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("SAFETY".to_string()),
            }),
            finish_reason: None,
        })
    })
    .oneshot(post(chat_body()))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    let body = json_body(response).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("SAFETY"), "unexpected message: {message}");
}

#[tokio::test]
async fn test_upstream_failure_returns_500_envelope() {
    let response = app(|| Err(ProviderError::Network("connection reset".to_string())))
        .oneshot(post(chat_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body, json!({"error": {"message": "Network error: connection reset"}}));
}

#[tokio::test]
async fn test_malformed_body_uses_policy() {
    let uniform = app(|| Ok(TurnReply::text("unused")))
        .oneshot(post("{not json"))
        .await
        .unwrap();
    assert_eq!(uniform.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&uniform);

    let (mapped, _) = app_with(|| Ok(TurnReply::text("unused")), ErrorStatusPolicy::Mapped);
    let response = mapped.oneshot(post("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"].as_str().unwrap().starts_with("Invalid request"));
}

#[tokio::test]
async fn test_empty_messages_rejected() {
    let body = json!({"model": "gemini-pro", "messages": []}).to_string();
    let (router, backend) = app_with(|| Ok(TurnReply::text("unused")), ErrorStatusPolicy::Mapped);

    let response = router.oneshot(post(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(backend.credentials.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mapped_auth_failure_is_401() {
    let (router, _) = app_with(
        || Err(ProviderError::Authentication("API key not valid".to_string())),
        ErrorStatusPolicy::Mapped,
    );

    let response = router.oneshot(post(chat_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app(|| Ok(TurnReply::text("unused")))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}
