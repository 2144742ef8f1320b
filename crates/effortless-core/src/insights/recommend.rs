//! Reward recommendation filter and ranking
//!
//! Shared by both insight modes: which text was produced never changes which
//! rewards are recommended.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::matching::geo_matches;
use crate::models::{Preferences, Reward, RewardType, Transaction};

/// Recommended rewards, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Auto-applicable rewards that need no enrollment
    pub auto_apply: Vec<Reward>,
    /// Opt-in "Priceless" experiences
    pub priceless: Vec<Reward>,
}

/// Ranking knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub top_k: usize,
    /// Value assigned to experience rewards
    pub experience_value: Decimal,
}

/// Value used to rank a reward
pub fn reward_value(reward: &Reward, experience_value: Decimal) -> Decimal {
    match reward.reward_type {
        RewardType::Experience => experience_value,
        RewardType::PercentageCashback => reward.percentage_value.unwrap_or(Decimal::ZERO),
        RewardType::FixedAmount => reward.fixed_amount_value.unwrap_or(Decimal::ZERO),
    }
}

/// Rewards a user has already had applied
pub fn triggered_reward_ids(user_id: i64, transactions: &[Transaction]) -> HashSet<i64> {
    transactions
        .iter()
        .filter(|t| t.user_id == user_id && t.reward_applied)
        .filter_map(|t| t.matched_reward_id)
        .collect()
}

/// Geo specificity descending, then value descending, then id ascending
pub fn compare_rewards(a: &Reward, b: &Reward, experience_value: Decimal) -> Ordering {
    b.geo_scope
        .specificity()
        .cmp(&a.geo_scope.specificity())
        .then_with(|| {
            reward_value(b, experience_value).cmp(&reward_value(a, experience_value))
        })
        .then_with(|| a.id.cmp(&b.id))
}

fn top_k(mut rewards: Vec<&Reward>, options: &RankOptions) -> Vec<Reward> {
    rewards.sort_by(|a, b| compare_rewards(a, b, options.experience_value));
    rewards.into_iter().take(options.top_k).cloned().collect()
}

/// Filter and rank the catalog for one user
///
/// Candidates are active at `now`, geo-eligible for `location` and not in
/// `triggered`. Experiences and opt-in rewards go to the priceless list;
/// silently auto-applicable rewards go to the auto-apply list.
pub fn recommend(
    catalog: &[Reward],
    location: Option<&str>,
    triggered: &HashSet<i64>,
    now: DateTime<Utc>,
    options: &RankOptions,
) -> Recommendations {
    let candidates: Vec<&Reward> = catalog
        .iter()
        .filter(|r| r.is_active_at(now))
        .filter(|r| geo_matches(r, location))
        .filter(|r| !triggered.contains(&r.id))
        .collect();

    let (priceless, rest): (Vec<&Reward>, Vec<&Reward>) =
        candidates.into_iter().partition(|r| r.is_priceless());
    let auto_apply: Vec<&Reward> = rest.into_iter().filter(|r| r.is_auto_apply()).collect();

    Recommendations {
        auto_apply: top_k(auto_apply, options),
        priceless: top_k(priceless, options),
    }
}

/// Whether the user wants to hear about Priceless experiences
pub fn wants_experience_notifications(prefs: &Preferences) -> bool {
    prefs.notifications_enabled && prefs.priceless_notifications_enabled
}
