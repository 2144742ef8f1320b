//! Reward catalog handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppError, AppState};
use effortless_core::models::Reward;
use effortless_core::RewardFilter;

/// Query parameters for listing rewards
#[derive(Debug, Deserialize)]
pub struct RewardQuery {
    /// Only rewards whose window includes now (default true)
    #[serde(default = "default_active_only")]
    pub active_only: bool,
    /// Case-insensitive category match
    pub category: Option<String>,
}

fn default_active_only() -> bool {
    true
}

/// GET /api/rewards - List the reward catalog
pub async fn list_rewards(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RewardQuery>,
) -> Result<Json<Vec<Reward>>, AppError> {
    let filter = RewardFilter::new()
        .active_at(params.active_only.then(Utc::now))
        .category(params.category.as_deref());

    Ok(Json(state.repo.list_rewards(&filter)?))
}

/// GET /api/rewards/:id - Get a single reward
pub async fn get_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Reward>, AppError> {
    let reward = state
        .repo
        .get_reward(id)?
        .ok_or_else(|| AppError::not_found(&format!("Reward {} not found", id)))?;

    Ok(Json(reward))
}
