// http server mode - chat and key limit endpoints

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::{Assistant, Error, QuotaReport, Turn};

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    prompt: Option<String>,
}

/// Envelope every endpoint answers with.
#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn ok(data: T, message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        }
    }

    fn fail(message: String) -> Self {
        Self {
            success: false,
            message,
            data: None,
        }
    }
}

#[derive(Serialize)]
struct QuotaResponse {
    report: String,
    #[serde(flatten)]
    limits: QuotaReport,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub struct Server;

impl Server {
    pub fn router(assistant: Arc<Assistant>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/ai/chat", post(chat))
            .route("/ai/key-limit", get(key_limit))
            .layer(CorsLayer::permissive())
            .with_state(assistant)
    }

    pub async fn run(assistant: Assistant, host: &str, port: u16) -> Result<(), Error> {
        let app = Self::router(Arc::new(assistant));

        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;
        info!("server running at http://{addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn chat(
    State(assistant): State<Arc<Assistant>>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<Envelope<Turn>>) {
    let prompt = req.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(Envelope::fail("prompt is required".to_string())),
        );
    }

    let turn = assistant.turn(&prompt).await;
    (
        StatusCode::OK,
        Json(Envelope::ok(turn, "AI response generated successfully")),
    )
}

async fn key_limit(
    State(assistant): State<Arc<Assistant>>,
) -> (StatusCode, Json<Envelope<QuotaResponse>>) {
    match assistant.check_quota().await {
        Ok(limits) => (
            StatusCode::OK,
            Json(Envelope::ok(
                QuotaResponse {
                    report: limits.to_string(),
                    limits,
                },
                "key limit fetched",
            )),
        ),
        Err(e) => {
            error!("key limit check failed: {e}");
            (StatusCode::BAD_GATEWAY, Json(Envelope::fail(e.to_string())))
        }
    }
}
