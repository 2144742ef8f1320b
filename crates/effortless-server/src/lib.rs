//! Effortless Web Server
//!
//! Axum-based REST API for the Effortless rewards dashboard.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Input validation (pagination limits, body size limits)
//! - Security headers on every response
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use effortless_core::ai::{AIBackend, AIClient};
use effortless_core::{InsightAssembler, Repository};

mod handlers;

/// Maximum request body size (10 KB)
pub const MAX_BODY_SIZE: usize = 10 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub assembler: InsightAssembler,
    pub config: ServerConfig,
    /// Reported by the health endpoint
    pub data_source: String,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, assembler: InsightAssembler, config: ServerConfig) -> Self {
        Self {
            repo,
            assembler,
            config,
            data_source: "CSV".to_string(),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState, static_dir: Option<&str>) -> Router {
    match state.assembler.ai() {
        Some(client) => info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!("ℹ️  AI backend not configured, insights use the templated fallback"),
    }

    let config = state.config.clone();
    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Users
        .route("/users", get(handlers::list_users))
        .route("/users/:id", get(handlers::get_user))
        .route(
            "/users/:id/preferences",
            get(handlers::get_preferences).put(handlers::update_preferences),
        )
        // Transactions
        .route("/users/:id/transactions", get(handlers::list_transactions))
        // Dashboard
        .route(
            "/users/:id/dashboard-summary",
            get(handlers::get_dashboard_summary),
        )
        .route("/users/:id/ai-insights", get(handlers::get_ai_insights))
        // Rewards
        .route("/rewards", get(handlers::list_rewards))
        .route("/rewards/:id", get(handlers::get_reward));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        // Allow specified origins
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // CSP: restrict scripts to same-origin, allow inline styles for the SPA
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    check_ai_connection(state.assembler.ai()).await;

    let users = state.repo.list_users()?.len();
    info!(users, data_source = %state.data_source, "Data loaded");

    let app = create_router(state, static_dir);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(ai: Option<&AIClient>) {
    match ai {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {}), insights will fall back",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable generated insights)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        // Caller mistakes surface as client errors with their message
        match err.downcast_ref::<effortless_core::Error>() {
            Some(effortless_core::Error::NotFound(what)) => {
                return Self::not_found(&format!("Not found: {}", what));
            }
            Some(effortless_core::Error::Validation(msg)) => return Self::bad_request(msg),
            _ => {}
        }
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
