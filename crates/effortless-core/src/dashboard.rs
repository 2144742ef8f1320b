//! Per-user operations over a repository
//!
//! Thin glue shared by the HTTP server and the CLI: look the user up (unknown
//! ids are not found), pull their rows and hand them to the aggregation or
//! insight layer.

use chrono::{DateTime, Duration, Utc};

use crate::aggregate::{aggregate, AggregateOptions, DashboardSummary};
use crate::error::Result;
use crate::insights::{InsightAssembler, InsightBundle, InsightRequest};
use crate::models::{Preferences, PreferencesUpdate};
use crate::store::{Repository, RewardFilter, TransactionFilter};

/// Dashboard summary for a user
pub fn dashboard_summary(
    repo: &dyn Repository,
    user_id: i64,
    options: &AggregateOptions,
) -> Result<DashboardSummary> {
    repo.require_user(user_id)?;
    let transactions = repo.list_transactions(&TransactionFilter::for_user(user_id))?;
    let catalog = repo.list_rewards(&RewardFilter::new())?;
    Ok(aggregate(user_id, &transactions, &catalog, options))
}

/// Cutoff for a trailing window of `days`
pub fn window_start(now: DateTime<Utc>, days: Option<u32>) -> Option<DateTime<Utc>> {
    days.map(|d| now - Duration::days(i64::from(d)))
}

/// Insight bundle for a user
///
/// Fails only when the user is unknown or the repository errors; generation
/// problems are absorbed by the assembler's fallback.
pub async fn insight_bundle(
    repo: &dyn Repository,
    assembler: &InsightAssembler,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<InsightBundle> {
    let user = repo.require_user(user_id)?;
    let preferences = repo.effective_preferences(&user)?;
    let transactions = repo.list_transactions(&TransactionFilter::for_user(user_id))?;
    let catalog = repo.list_rewards(&RewardFilter::new())?;

    let config = assembler.config();
    let options = AggregateOptions::default()
        .recent_limit(config.recent_limit)
        .since(window_start(now, config.window_days));
    let summary = aggregate(user_id, &transactions, &catalog, &options);

    let request = InsightRequest {
        user: &user,
        preferences: &preferences,
        summary: &summary,
        transactions: &transactions,
        catalog: &catalog,
        now,
    };
    Ok(assembler.assemble(&request).await)
}

/// Preferences for a user, defaults when none were saved
pub fn get_preferences(repo: &dyn Repository, user_id: i64) -> Result<Preferences> {
    let user = repo.require_user(user_id)?;
    repo.effective_preferences(&user)
}

/// Validate and store a whole-object preferences replacement
pub fn replace_preferences(
    repo: &dyn Repository,
    user_id: i64,
    update: PreferencesUpdate,
    now: DateTime<Utc>,
) -> Result<Preferences> {
    repo.require_user(user_id)?;
    let prefs = update.into_preferences(user_id, now)?;
    repo.replace_preferences(prefs)
}
