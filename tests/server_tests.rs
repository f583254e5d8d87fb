// tests for the http endpoints

use std::sync::Arc;

use async_trait::async_trait;
use haymart_ai::{
    Assistant, Error, Llm, QueryExecutor, QueryResult, QuotaReport, REFUSAL, RetryPolicy,
    SafeSelect, Server, Window,
};
use serde_json::{Value, json};

/// Echoes a fixed sql, then a fixed narration.
struct CannedLlm {
    sql: &'static str,
    quota_ok: bool,
}

#[async_trait]
impl Llm for CannedLlm {
    async fn complete(&self, system: &str, _user: &str) -> Result<String, Error> {
        if system.contains("MySQL") {
            Ok(self.sql.to_string())
        } else {
            Ok("Ada 3 produk.".to_string())
        }
    }

    async fn check_quota(&self) -> Result<QuotaReport, Error> {
        if !self.quota_ok {
            return Err(Error::Upstream {
                status: 401,
                body: "invalid key".into(),
            });
        }
        let window = Window {
            limit: 10,
            remaining: 7,
            reset_seconds: 60,
        };
        Ok(QuotaReport {
            requests: window,
            tokens: window,
        })
    }
}

struct ThreeRows;

#[async_trait]
impl QueryExecutor for ThreeRows {
    async fn execute(&self, _sql: &SafeSelect) -> Result<QueryResult, Error> {
        Ok(QueryResult::new(vec!["n".into()], vec![vec![json!(3)]]))
    }
}

async fn spawn(sql: &'static str, quota_ok: bool) -> String {
    let assistant = Assistant::new(Arc::new(CannedLlm { sql, quota_ok }), Arc::new(ThreeRows))
        .with_retry(RetryPolicy::none());
    let app = Server::router(Arc::new(assistant));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn post_chat(base: &str, body: Value) -> (u16, Value) {
    let res = reqwest::Client::new()
        .post(format!("{base}/ai/chat"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let base = spawn("SELECT 1", true).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_chat_answers() {
    let base = spawn("SELECT COUNT(*) FROM produk", true).await;
    let (status, body) = post_chat(&base, json!({ "prompt": "berapa produk?" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["answer"], "Ada 3 produk.");
    assert_eq!(body["data"]["sql"], "SELECT COUNT(*) FROM produk");
    assert_eq!(body["data"]["outcome"], "answered");
}

#[tokio::test]
async fn test_chat_refusal_is_still_ok() {
    let base = spawn("DELETE FROM produk", true).await;
    let (status, body) = post_chat(&base, json!({ "prompt": "Hapus semua produk" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["answer"], REFUSAL);
    assert_eq!(body["data"]["outcome"], "refused");
}

#[tokio::test]
async fn test_chat_blank_prompt_is_bad_request() {
    let base = spawn("SELECT 1", true).await;

    let (status, body) = post_chat(&base, json!({ "prompt": "   " })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let (status, _) = post_chat(&base, json!({})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_key_limit() {
    let base = spawn("SELECT 1", true).await;
    let res = reqwest::get(format!("{base}/ai/key-limit")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["requests"]["remaining"], 7);
    assert!(body["data"]["report"]
        .as_str()
        .unwrap()
        .contains("10 total, 7 tersisa"));
}

#[tokio::test]
async fn test_key_limit_failure_surfaces() {
    let base = spawn("SELECT 1", false).await;
    let res = reqwest::get(format!("{base}/ai/key-limit")).await.unwrap();
    assert_eq!(res.status().as_u16(), 502);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("401"));
}
