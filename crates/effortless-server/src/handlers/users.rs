//! User and preference handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::{AppError, AppState, MAX_BODY_SIZE};
use effortless_core::dashboard;
use effortless_core::models::{Preferences, PreferencesUpdate, User};

/// GET /api/users - List users
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.repo.list_users()?))
}

/// GET /api/users/:id - Get a single user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let user = state
        .repo
        .get_user(id)?
        .ok_or_else(|| AppError::not_found(&format!("User {} not found", id)))?;

    Ok(Json(user))
}

/// GET /api/users/:id/preferences - Stored preferences, or defaults
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Preferences>, AppError> {
    Ok(Json(dashboard::get_preferences(state.repo.as_ref(), id)?))
}

/// PUT /api/users/:id/preferences - Replace preferences as a whole
///
/// The body must carry every flag; a body that fails to parse or validate
/// leaves the stored preferences untouched.
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Preferences>, AppError> {
    // Unknown users are 404 even when the body is bad
    state
        .repo
        .get_user(id)?
        .ok_or_else(|| AppError::not_found(&format!("User {} not found", id)))?;

    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let update: PreferencesUpdate = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid preferences: {}", e)))?;

    let saved = dashboard::replace_preferences(state.repo.as_ref(), id, update, Utc::now())?;
    info!(user_id = id, "Preferences replaced");

    Ok(Json(saved))
}
