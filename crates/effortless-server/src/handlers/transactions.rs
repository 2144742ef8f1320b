//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use effortless_core::models::Transaction;
use effortless_core::TransactionFilter;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub transactions: Vec<Transaction>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// GET /api/users/:id/transactions - A user's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<TransactionResponse>, AppError> {
    state.repo.require_user(id)?;

    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);

    let filter = TransactionFilter::for_user(id)
        .limit(Some(limit))
        .offset(params.offset);
    let transactions = state.repo.list_transactions(&filter)?;
    let total = state.repo.count_transactions(&filter)?;

    Ok(Json(TransactionResponse {
        transactions,
        total,
        limit,
        offset: params.offset,
    }))
}
