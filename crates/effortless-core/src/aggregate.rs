//! Aggregation Engine
//!
//! Turns a user's transactions and the reward catalog into the dashboard
//! summary: balance, savings KPIs, per-category tables and recent reward
//! activity. Pure function of its inputs; the same inputs always produce the
//! same summary.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Reward, Transaction};

/// Number of recent applied/missed rewards shown on the dashboard
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Category label for transactions without one
pub const UNCATEGORIZED: &str = "Other";

/// How an applied reward reached the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsChannel {
    /// Applied silently
    AutoApply,
    /// Surfaced through a notification the user acted on
    Notification,
}

impl SavingsChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoApply => "auto_apply",
            Self::Notification => "notification",
        }
    }
}

/// Why a matched reward did not apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// The reward needs an enrollment the user never gave
    OptInRequired,
    /// Auto-applicable reward that did not apply
    NotApplied,
    /// Matched reward is no longer in the catalog
    Unknown,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OptInRequired => "opt_in_required",
            Self::NotApplied => "not_applied",
            Self::Unknown => "unknown",
        }
    }
}

/// Savings rolled up by category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySavings {
    pub category: String,
    pub count: usize,
    pub total_savings: Decimal,
}

/// Spending rolled up by category (absolute amounts of debits)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: String,
    pub count: usize,
    pub total_spent: Decimal,
}

/// A transaction where a reward applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardActivity {
    pub transaction_id: i64,
    pub transaction_at: DateTime<Utc>,
    pub description: String,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub amount: Decimal,
    pub reward_id: Option<i64>,
    pub reward_label: Option<String>,
    pub savings_amount: Decimal,
    pub channel: SavingsChannel,
}

/// A transaction matched to a reward that never applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedReward {
    pub transaction_id: i64,
    pub transaction_at: DateTime<Utc>,
    pub description: String,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub amount: Decimal,
    pub reward_id: i64,
    pub reward_label: Option<String>,
    pub reason: MissReason,
}

/// Per-user dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub user_id: i64,
    pub total_balance: Decimal,
    pub total_transactions: usize,
    pub saved_via_auto_apply: Decimal,
    pub saved_via_notifications: Decimal,
    pub rewards_by_category: Vec<CategorySavings>,
    pub spending_by_category: Vec<CategorySpending>,
    pub recent_rewards_applied: Vec<RewardActivity>,
    pub recent_rewards_missed: Vec<MissedReward>,
    /// Cutoff applied to savings, categories and recent lists, if any
    pub since: Option<DateTime<Utc>>,
}

impl DashboardSummary {
    /// Savings across both channels
    pub fn total_savings(&self) -> Decimal {
        self.saved_via_auto_apply + self.saved_via_notifications
    }

    /// Category with the largest spend
    pub fn top_spending_category(&self) -> Option<&str> {
        self.spending_by_category.first().map(|c| c.category.as_str())
    }

    /// Number of reward-applied transactions counted in the summary
    pub fn rewards_applied_count(&self) -> usize {
        self.rewards_by_category.iter().map(|c| c.count).sum()
    }
}

/// Options for [`aggregate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub recent_limit: usize,
    pub since: Option<DateTime<Utc>>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_LIMIT,
            since: None,
        }
    }
}

impl AggregateOptions {
    pub fn recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }
}

/// Channel an applied transaction counts toward
///
/// The catalog entry decides first: opt-in rewards are notification savings,
/// auto-applicable ones are auto-apply savings. Without a usable catalog
/// entry the transaction's own `notification_triggered` flag decides.
pub fn savings_channel(tx: &Transaction, reward: Option<&Reward>) -> SavingsChannel {
    match reward {
        Some(r) if r.requires_opt_in => SavingsChannel::Notification,
        Some(r) if r.is_auto_applicable => SavingsChannel::AutoApply,
        _ if tx.notification_triggered => SavingsChannel::Notification,
        _ => SavingsChannel::AutoApply,
    }
}

/// Reason a matched reward was missed
pub fn miss_reason(reward: Option<&Reward>) -> MissReason {
    match reward {
        None => MissReason::Unknown,
        Some(r) if r.requires_opt_in => MissReason::OptInRequired,
        Some(_) => MissReason::NotApplied,
    }
}

fn catalog_index(catalog: &[Reward]) -> HashMap<i64, &Reward> {
    catalog.iter().map(|r| (r.id, r)).collect()
}

fn category_of(tx: &Transaction) -> &str {
    tx.category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNCATEGORIZED)
}

/// A user's transactions at or after `since`, newest first (ties: id descending)
fn windowed<'a>(
    user_id: i64,
    transactions: &'a [Transaction],
    since: Option<DateTime<Utc>>,
) -> Vec<&'a Transaction> {
    let mut txs: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.user_id == user_id)
        .filter(|t| since.map_or(true, |cutoff| t.transaction_at >= cutoff))
        .collect();
    txs.sort_by(|a, b| {
        b.transaction_at
            .cmp(&a.transaction_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    txs
}

fn to_activity(tx: &Transaction, reward: Option<&Reward>) -> RewardActivity {
    RewardActivity {
        transaction_id: tx.id,
        transaction_at: tx.transaction_at,
        description: tx.description.clone(),
        merchant: tx.merchant.clone(),
        category: tx.category.clone(),
        amount: tx.amount,
        reward_id: tx.matched_reward_id,
        reward_label: reward.map(|r| r.label.clone()),
        savings_amount: tx.realized_savings(),
        channel: savings_channel(tx, reward),
    }
}

fn to_missed(tx: &Transaction, reward_id: i64, reward: Option<&Reward>) -> MissedReward {
    MissedReward {
        transaction_id: tx.id,
        transaction_at: tx.transaction_at,
        description: tx.description.clone(),
        merchant: tx.merchant.clone(),
        category: tx.category.clone(),
        amount: tx.amount,
        reward_id,
        reward_label: reward.map(|r| r.label.clone()),
        reason: miss_reason(reward),
    }
}

// `window` is newest first, as returned by `windowed`
fn applied_in(
    window: &[&Transaction],
    index: &HashMap<i64, &Reward>,
    limit: usize,
) -> Vec<RewardActivity> {
    window
        .iter()
        .filter(|t| t.reward_applied)
        .take(limit)
        .map(|t| to_activity(t, t.matched_reward_id.and_then(|id| index.get(&id).copied())))
        .collect()
}

fn missed_in(
    window: &[&Transaction],
    index: &HashMap<i64, &Reward>,
    limit: usize,
) -> Vec<MissedReward> {
    window
        .iter()
        .filter(|t| t.is_missed())
        .filter_map(|t| t.matched_reward_id.map(|id| (*t, id)))
        .take(limit)
        .map(|(t, id)| to_missed(t, id, index.get(&id).copied()))
        .collect()
}

/// Most recent reward-applied transactions for a user
pub fn recent_rewards_applied(
    user_id: i64,
    transactions: &[Transaction],
    catalog: &[Reward],
    limit: usize,
    since: Option<DateTime<Utc>>,
) -> Vec<RewardActivity> {
    let index = catalog_index(catalog);
    applied_in(&windowed(user_id, transactions, since), &index, limit)
}

/// Most recent matched-but-unapplied transactions for a user
pub fn recent_rewards_missed(
    user_id: i64,
    transactions: &[Transaction],
    catalog: &[Reward],
    limit: usize,
    since: Option<DateTime<Utc>>,
) -> Vec<MissedReward> {
    let index = catalog_index(catalog);
    missed_in(&windowed(user_id, transactions, since), &index, limit)
}

/// Build the dashboard summary for `user_id`
///
/// `transactions` may hold every user's rows; only `user_id`'s are counted.
/// Balance and transaction count are always all-time; the remaining fields
/// honor `options.since`.
pub fn aggregate(
    user_id: i64,
    transactions: &[Transaction],
    catalog: &[Reward],
    options: &AggregateOptions,
) -> DashboardSummary {
    let index = catalog_index(catalog);

    let mut total_balance = Decimal::ZERO;
    let mut total_transactions = 0;
    for tx in transactions.iter().filter(|t| t.user_id == user_id) {
        total_balance += tx.amount;
        total_transactions += 1;
    }

    let mut saved_via_auto_apply = Decimal::ZERO;
    let mut saved_via_notifications = Decimal::ZERO;
    let mut savings: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();
    let mut spending: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();

    let window = windowed(user_id, transactions, options.since);
    for tx in &window {
        if tx.amount.is_sign_negative() && !tx.amount.is_zero() {
            let entry = spending.entry(category_of(tx)).or_default();
            entry.0 += 1;
            entry.1 += tx.amount.abs();
        }

        if !tx.reward_applied {
            continue;
        }
        let saved = tx.realized_savings();
        let reward = tx.matched_reward_id.and_then(|id| index.get(&id).copied());
        match savings_channel(tx, reward) {
            SavingsChannel::AutoApply => saved_via_auto_apply += saved,
            SavingsChannel::Notification => saved_via_notifications += saved,
        }
        let entry = savings.entry(category_of(tx)).or_default();
        entry.0 += 1;
        entry.1 += saved;
    }

    let mut rewards_by_category: Vec<CategorySavings> = savings
        .into_iter()
        .map(|(category, (count, total_savings))| CategorySavings {
            category: category.to_string(),
            count,
            total_savings,
        })
        .collect();
    // BTreeMap order is category ascending; a stable sort keeps it for ties
    rewards_by_category.sort_by(|a, b| b.total_savings.cmp(&a.total_savings));

    let mut spending_by_category: Vec<CategorySpending> = spending
        .into_iter()
        .map(|(category, (count, total_spent))| CategorySpending {
            category: category.to_string(),
            count,
            total_spent,
        })
        .collect();
    spending_by_category.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));

    let recent_rewards_applied = applied_in(&window, &index, options.recent_limit);
    let recent_rewards_missed = missed_in(&window, &index, options.recent_limit);

    DashboardSummary {
        user_id,
        total_balance,
        total_transactions,
        saved_via_auto_apply,
        saved_via_notifications,
        rewards_by_category,
        spending_by_category,
        recent_rewards_applied,
        recent_rewards_missed,
        since: options.since,
    }
}
