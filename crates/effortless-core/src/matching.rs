//! Reward matching and savings calculation

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{GeoScope, Preferences, Reward, RewardType, Transaction, User};

/// Location used for geo-scoped rewards: the preference override, else the home location
pub fn effective_location<'a>(user: &'a User, prefs: Option<&'a Preferences>) -> Option<&'a str> {
    prefs
        .and_then(|p| p.geo_location.as_deref())
        .filter(|g| !g.trim().is_empty())
        .or(user.home_location.as_deref())
        .filter(|g| !g.trim().is_empty())
}

/// Whether a reward's geographic scope covers `location`
///
/// Global rewards always match. City and country rewards need one of the
/// comma-separated parts of `location` to equal the reward's city or country,
/// ignoring case, so "San Francisco, CA" matches a "San Francisco" reward.
pub fn geo_matches(reward: &Reward, location: Option<&str>) -> bool {
    let target = match reward.geo_scope {
        GeoScope::Global => return true,
        GeoScope::City => reward.geo_city.as_deref(),
        GeoScope::Country => reward.geo_country.as_deref(),
    };

    match (target, location) {
        (Some(target), Some(location)) => {
            let target = target.trim().to_lowercase();
            !target.is_empty()
                && location
                    .split(',')
                    .any(|part| part.trim().to_lowercase() == target)
        }
        _ => false,
    }
}

/// Rewards that match a transaction, in catalog order
///
/// A reward matches when its window contains the transaction time, its
/// merchant or category lines up with the transaction, and its geo scope
/// covers `location`. When the user has auto-apply enabled and an
/// auto-applicable reward matches, only the first such reward is returned.
pub fn find_matching_rewards<'a>(
    tx: &Transaction,
    location: Option<&str>,
    prefs: Option<&Preferences>,
    catalog: &'a [Reward],
) -> Vec<&'a Reward> {
    let merchant = tx.merchant.as_deref().map(str::to_lowercase);
    let category = tx.category.as_deref().map(str::to_lowercase);
    if merchant.is_none() && category.is_none() {
        return vec![];
    }

    let matches: Vec<&Reward> = catalog
        .iter()
        .filter(|r| r.is_active_at(tx.transaction_at))
        .filter(|r| {
            let merchant_match = merchant
                .as_deref()
                .is_some_and(|m| r.merchant_name.to_lowercase().contains(m));
            let category_match = match (&category, &r.category) {
                (Some(c), Some(rc)) => rc.to_lowercase() == *c,
                _ => false,
            };
            merchant_match || category_match
        })
        .filter(|r| geo_matches(r, location))
        .collect();

    if prefs.is_some_and(|p| p.auto_apply_rewards_enabled) {
        if let Some(auto) = matches.iter().find(|r| r.is_auto_apply()) {
            return vec![*auto];
        }
    }

    matches
}

/// Savings a reward yields on a transaction, rounded to cents
pub fn calculate_savings(tx: &Transaction, reward: &Reward) -> Decimal {
    let amount = tx.amount.abs();

    let savings = match (reward.reward_type, reward.percentage_value, reward.fixed_amount_value) {
        (RewardType::PercentageCashback, Some(pct), _) => {
            let raw = amount * pct / Decimal::ONE_HUNDRED;
            match reward.max_savings_amount {
                Some(max) => raw.min(max),
                None => raw,
            }
        }
        (RewardType::FixedAmount, _, Some(fixed)) => fixed,
        _ => Decimal::ZERO,
    };

    savings.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
