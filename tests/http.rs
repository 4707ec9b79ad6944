mod common;

use axum::body::{ to_bytes, Body };
use axum::http::{ Request, StatusCode };
use axum::Router;
use serde_json::{ json, Value };
use std::time::Duration;
use tower::ServiceExt;

use common::Harness;
use gramsathi::server::api::{ router, AppState };

const KEY: &str = "secret";

fn app(h: &Harness, rate_limit: u32) -> Router {
    router(AppState::new(h.agent.clone(), Some(KEY.into()), rate_limit), Duration::from_secs(5))
}

fn post(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("POST").uri(uri).header("content-type", "application/json")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn authed(uri: &str, body: Value) -> Request<Body> {
    post(uri)
        .header("X-API-Key", KEY)
        .header("X-User-Id", "u1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn healthz_needs_no_credentials() {
    let h = Harness::new();
    let response = app(&h, 10)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap()).await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_returns_the_camel_case_response() {
    let h = Harness::new();
    let (status, body) = send(app(&h, 10), authed("/chat", json!({"text": "मुझे बुखार है", "language": "hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["conversationId"].as_str().unwrap().is_empty());
    assert_eq!(body["isEmergency"], json!(false));
    assert_eq!(body["intent"], json!("health"));
    assert_eq!(body["userText"], json!("मुझे बुखार है"));
    assert_eq!(body["audioUrl"], Value::Null);
    assert!(body.get("doctorSummary").is_none());
}

#[tokio::test]
async fn wrong_api_key_is_rejected() {
    let h = Harness::new();
    let request = post("/chat")
        .header("X-API-Key", "nope")
        .header("X-User-Id", "u1")
        .body(Body::from(json!({"text": "fever"}).to_string()))
        .unwrap();

    let (status, body) = send(app(&h, 10), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Unauthorized"));
    assert_eq!(h.chat.calls(), 0);
}

#[tokio::test]
async fn caller_identity_is_required() {
    let h = Harness::new();
    let request = post("/health/query")
        .header("X-API-Key", KEY)
        .body(Body::from(json!({"text": "fever"}).to_string()))
        .unwrap();

    let (status, body) = send(app(&h, 10), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("X-User-Id header is required"));
}

#[tokio::test]
async fn ai_failures_map_to_service_unavailable() {
    let h = Harness::new();
    h.chat.queue_failure("upstream said: invalid api key sk-123");

    let (status, body) = send(app(&h, 10), authed("/chat", json!({"text": "fever", "language": "en"}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "AI service unavailable"}));
}

#[tokio::test]
async fn health_query_returns_the_doctor_summary() {
    let h = Harness::new();
    h.chat.queue("Rest.");
    h.chat.queue("Chief Complaint: fever");

    let (status, body) = send(
        app(&h, 10),
        authed("/health/query", json!({"text": "fever", "language": "en", "generateSummary": true}))
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], json!("Rest."));
    assert_eq!(body["doctorSummary"], json!("Chief Complaint: fever"));
}

#[tokio::test]
async fn directory_endpoint_validates_the_pincode() {
    let h = Harness::new();

    let (status, body) = send(app(&h, 10), authed("/health/nearby", json!({"pincode": "32A008"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Valid 6-digit pincode is required"));

    let (status, body) = send(app(&h, 10), authed("/health/nearby", json!({"pincode": "324008"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["facilities"].as_array().unwrap().len(), 3);
    assert_eq!(body["facilities"][0]["source"], json!("directory"));
}

#[tokio::test]
async fn global_rate_limit_rejects_bursts() {
    let h = Harness::new();
    let app = app(&h, 1);

    let (first, _) = send(app.clone(), authed("/chat", json!({"text": "fever", "language": "en"}))).await;
    let (second, body) = send(app, authed("/chat", json!({"text": "fever", "language": "en"}))).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], json!("Too many requests"));
}

#[tokio::test]
async fn slow_requests_time_out() {
    let h = Harness::new();
    h.chat.respond_after(Duration::from_secs(5));
    let app = router(AppState::new(h.agent.clone(), Some(KEY.into()), 10), Duration::from_millis(50));

    let (status, _) = send(app, authed("/chat", json!({"text": "fever", "language": "en"}))).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}
