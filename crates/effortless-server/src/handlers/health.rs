//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use effortless_core::ai::AIBackend;
use effortless_core::RewardFilter;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub data_source: String,
    pub users: usize,
    pub rewards: usize,
    /// Model used for generated insights, absent in fallback-only mode
    pub ai_model: Option<String>,
}

/// GET /api/health - Service status and data-source summary
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        data_source: state.data_source.clone(),
        users: state.repo.list_users()?.len(),
        rewards: state.repo.list_rewards(&RewardFilter::new())?.len(),
        ai_model: state.assembler.ai().map(|ai| ai.model().to_string()),
    }))
}
