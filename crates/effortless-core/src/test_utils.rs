//! Test utilities for effortless-core
//!
//! This module provides testing infrastructure including a mock Ollama server
//! that can be used for development and integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// How the mock answers `/api/generate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Insights,
    ServerError,
    Garbage,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(Behavior::Insights).await
    }

    /// Start a server whose generate endpoint always returns 500
    pub async fn start_failing() -> Self {
        Self::start_with(Behavior::ServerError).await
    }

    /// Start a server whose generate endpoint replies with non-JSON text
    pub async fn start_garbage() -> Self {
        Self::start_with(Behavior::Garbage).await
    }

    async fn start_with(behavior: Behavior) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(Arc::new(behavior));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(behavior): State<Arc<Behavior>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let response = match *behavior {
        Behavior::ServerError => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
        }
        Behavior::Garbage => "I'm sorry, I can't help with that.".to_string(),
        // These patterns match prompts/dashboard_insights.md
        Behavior::Insights if request.prompt.contains("\"top_insights\"") => {
            insights_mock(&request.prompt)
        }
        Behavior::Insights => r#"{"summary_text": "", "top_insights": []}"#.to_string(),
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
    .into_response()
}

/// Build an insights reply that echoes values from the rendered prompt
fn insights_mock(prompt: &str) -> String {
    let user = prompt_field(prompt, "User: ").unwrap_or("there");
    let savings = prompt_field(prompt, "- Total savings: $").unwrap_or("0.00");
    let missed = prompt_field(prompt, "- Rewards missed: ").unwrap_or("0");

    serde_json::json!({
        "summary_text": format!("Hi {}, you saved ${} with Effortless rewards.", user, savings),
        "top_insights": [
            format!("Total savings so far: ${}", savings),
            format!("Missed rewards: {}", missed),
        ],
    })
    .to_string()
}

/// Rest of the first line starting with `label`
fn prompt_field<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(label))
        .map(str::trim)
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}
