// tests for the llm gateway client against a local stub provider

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use haymart_ai::{Config, Error, Llm, OpenRouter};
use serde_json::{Value, json};

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    body: Value,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn completions(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.seen.lock().unwrap().push((headers, body));
    (stub.status, Json(stub.body.clone()))
}

async fn key(State(stub): State<Stub>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    stub.seen.lock().unwrap().push((headers, Value::Null));
    (stub.status, Json(stub.body.clone()))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({}))
}

// serve the stub on an ephemeral port, return its base url
async fn spawn(stub: Stub) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .route("/v1/key", get(key))
        .route("/slow/chat/completions", post(slow))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn stub(status: StatusCode, body: Value) -> Stub {
    Stub {
        status,
        body,
        seen: Arc::default(),
    }
}

fn client(base: &str) -> OpenRouter {
    let config = Config::new("sk-test")
        .unwrap()
        .with_base_url(format!("{base}/v1"))
        .unwrap();
    OpenRouter::new(&config).unwrap()
}

#[tokio::test]
async fn test_complete_extracts_first_choice() {
    let stub = stub(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "role": "assistant", "content": "SELECT 1" } }] }),
    );
    let seen = stub.seen.clone();
    let base = spawn(stub).await;

    let text = client(&base).complete("sys", "hitung").await.unwrap();
    assert_eq!(text, "SELECT 1");

    let seen = seen.lock().unwrap();
    let (headers, body) = &seen[0];
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(headers["x-title"], "HayMart AI");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["temperature"], 0);
    assert_eq!(body["max_tokens"], 300);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "sys");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "hitung");
}

#[tokio::test]
async fn test_complete_missing_choices_is_malformed() {
    let base = spawn(stub(StatusCode::OK, json!({ "choices": [] }))).await;

    let err = client(&base).complete("sys", "x").await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_complete_wrong_shape_is_malformed() {
    let base = spawn(stub(StatusCode::OK, json!({ "error": "nope" }))).await;

    let err = client(&base).complete("sys", "x").await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_complete_http_error_carries_status() {
    let base = spawn(stub(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "rate limited" } }),
    ))
    .await;

    let err = client(&base).complete("sys", "x").await.unwrap_err();
    match &err {
        Error::Upstream { status, body } => {
            assert_eq!(*status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unauthorized_is_not_retryable() {
    let base = spawn(stub(StatusCode::UNAUTHORIZED, json!({}))).await;

    let err = client(&base).complete("sys", "x").await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_quota_reads_all_six_fields() {
    let stub = stub(
        StatusCode::OK,
        json!({
            "rate_limits": {
                "requests": { "limit": 200, "remaining": 150, "reset_seconds": 3600 },
                "tokens": { "limit": 100000, "remaining": 50000, "reset_seconds": 3600 }
            }
        }),
    );
    let seen = stub.seen.clone();
    let base = spawn(stub).await;

    let report = client(&base).check_quota().await.unwrap();

    assert_eq!(report.requests.limit, 200);
    assert_eq!(report.requests.remaining, 150);
    assert_eq!(report.requests.reset_seconds, 3600);
    assert_eq!(report.tokens.limit, 100000);
    assert_eq!(report.tokens.remaining, 50000);
    assert_eq!(report.tokens.reset_seconds, 3600);
    assert_eq!(seen.lock().unwrap()[0].0["authorization"], "Bearer sk-test");

    let text = report.to_string();
    assert!(text.contains("Requests: 200 total, 150 tersisa (reset 3600 detik)"));
    assert!(text.contains("Tokens: 100000 total, 50000 tersisa (reset 3600 detik)"));
}

#[tokio::test]
async fn test_quota_missing_field_fails() {
    let base = spawn(stub(
        StatusCode::OK,
        json!({
            "rate_limits": {
                "requests": { "limit": 200, "remaining": 150 },
                "tokens": { "limit": 100000, "remaining": 50000, "reset_seconds": 3600 }
            }
        }),
    ))
    .await;

    let err = client(&base).check_quota().await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_quota_missing_rate_limits_fails() {
    let base = spawn(stub(StatusCode::OK, json!({ "data": { "label": "key" } }))).await;

    assert!(client(&base).check_quota().await.is_err());
}

#[tokio::test]
async fn test_timeout_is_enforced() {
    let base = spawn(stub(StatusCode::OK, json!({}))).await;
    let config = Config::new("sk-test")
        .unwrap()
        .with_base_url(format!("{base}/slow"))
        .unwrap()
        .with_timeout(Duration::from_millis(200))
        .unwrap();
    let llm = OpenRouter::new(&config).unwrap();

    let err = llm.complete("sys", "x").await.unwrap_err();
    assert!(matches!(&err, Error::Http(e) if e.is_timeout()));
    assert!(err.is_retryable());
}

#[test]
fn test_blank_api_key_is_config_error() {
    assert!(matches!(Config::new("  "), Err(Error::MissingApiKey)));
}

#[test]
fn test_bad_base_url_is_config_error() {
    let err = Config::new("sk").unwrap().with_base_url("ftp://x").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_endpoint_urls() {
    let config = Config::new("sk")
        .unwrap()
        .with_base_url("https://openrouter.ai/api/v1/")
        .unwrap();
    assert_eq!(config.chat_url(), "https://openrouter.ai/api/v1/chat/completions");
    assert_eq!(config.key_url(), "https://openrouter.ai/api/v1/key");
}
