//! Dashboard summary and AI insight handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppError, AppState};
use effortless_core::dashboard::{self, window_start};
use effortless_core::{AggregateOptions, DashboardSummary, InsightBundle};

/// Most recent entries a caller may ask for
const MAX_RECENT_LIMIT: usize = 100;

/// Query parameters for the dashboard summary
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Entries in each recent-rewards list (default from config)
    pub recent_limit: Option<usize>,
    /// Trailing window in days for savings and spending (default all time)
    pub days: Option<u32>,
}

/// GET /api/users/:id/dashboard-summary - Aggregated dashboard numbers
pub async fn get_dashboard_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    if params.days == Some(0) {
        return Err(AppError::bad_request("days must be at least 1"));
    }

    let recent_limit = params
        .recent_limit
        .unwrap_or(state.assembler.config().recent_limit)
        .min(MAX_RECENT_LIMIT);
    let options = AggregateOptions::default()
        .recent_limit(recent_limit)
        .since(window_start(Utc::now(), params.days));

    Ok(Json(dashboard::dashboard_summary(
        state.repo.as_ref(),
        id,
        &options,
    )?))
}

/// GET /api/users/:id/ai-insights - Insight text and ranked recommendations
///
/// Always answers for a known user: generation problems fall back to
/// templated text.
pub async fn get_ai_insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<InsightBundle>, AppError> {
    let bundle =
        dashboard::insight_bundle(state.repo.as_ref(), &state.assembler, id, Utc::now()).await?;

    Ok(Json(bundle))
}
