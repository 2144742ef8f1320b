//! Demo data generator
//!
//! Two cardholders (San Francisco and New York), their default preferences,
//! a seven-entry reward catalog and 30 days of card activity. Each generated
//! transaction is enriched and matched against the catalog; rewards apply
//! silently when the user has auto-apply on and the reward allows it, and a
//! share of opt-in matches apply through a notification.
//!
//! Generation is seeded, so the same seed and `now` give the same tables.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::enrich::Enricher;
use crate::error::Result;
use crate::matching::{calculate_savings, effective_location, find_matching_rewards};
use crate::models::{GeoScope, Preferences, Reward, RewardType, Transaction, User};
use crate::store::Tables;

/// Days of history generated
pub const HISTORY_DAYS: i64 = 30;

/// Share of notification-driven matches the user acts on, in percent
const NOTIFICATION_ACCEPT_PERCENT: u32 = 30;

/// (description, memo, amount in cents)
const TRANSACTION_TEMPLATES: &[(&str, &str, i64)] = &[
    // Dining
    ("STARBUCKS STORE #12345", "Purchase at Starbucks Coffee", -550),
    ("SBUX #67890", "Coffee purchase", -475),
    ("MCDONALDS #111", "Fast food purchase", -1230),
    ("RESTAURANT XYZ", "Dinner payment", -4500),
    ("COFFEE SHOP SF", "Morning coffee", -625),
    // Travel
    ("UBER TRIP", "Ride share payment", -1850),
    ("UBER *RIDE", "Uber ride to airport", -3200),
    ("LYFT RIDE", "Lyft transportation", -1575),
    ("HOTEL BOOKING", "Hotel reservation", -15000),
    ("AIRLINE TICKET", "Flight booking", -35000),
    // Groceries
    ("WHOLE FOODS MARKET", "Grocery purchase", -8550),
    ("WHOLE FOODS #SF", "Weekly groceries", -12000),
    ("TARGET STORE", "Shopping at Target", -6525),
    ("WALMART SUPER", "Grocery shopping", -9500),
    // Shopping
    ("AMAZON.COM", "Online purchase", -2999),
    ("AMAZON MARKETPLACE", "Amazon order", -4550),
    ("AMAZON PRIME", "Prime subscription", -1499),
    // Entertainment
    ("NETFLIX", "Streaming subscription", -1599),
    ("SPOTIFY PREMIUM", "Music subscription", -999),
    ("MOVIE THEATER", "Cinema tickets", -2400),
    // Income
    ("PAYROLL DEPOSIT", "Salary payment", 350000),
    ("DIRECT DEPOSIT", "Monthly salary", 350000),
];

/// Demo cardholders
pub fn demo_users() -> Vec<User> {
    vec![
        User {
            id: 1001,
            name: "Sarah Johnson".to_string(),
            email: Some("sarah.johnson@example.com".to_string()),
            home_location: Some("San Francisco, CA".to_string()),
        },
        User {
            id: 1002,
            name: "Michael Chen".to_string(),
            email: Some("michael.chen@example.com".to_string()),
            home_location: Some("New York, NY".to_string()),
        },
    ]
}

struct RewardSpec {
    merchant: &'static str,
    reward_type: RewardType,
    label: &'static str,
    description: &'static str,
    category: &'static str,
    terms: &'static str,
    start_days_ago: i64,
    end_days_ahead: i64,
    city: Option<&'static str>,
    /// Percent for cashback, dollars for experiences
    value: i64,
    max_savings: Option<i64>,
}

const REWARD_SPECS: &[RewardSpec] = &[
    RewardSpec {
        merchant: "Starbucks",
        reward_type: RewardType::PercentageCashback,
        label: "5% Cashback at Starbucks",
        description: "Get 5% cashback on all Starbucks purchases",
        category: "dining",
        terms: "Valid at all Starbucks locations. Max $50 savings per month.",
        start_days_ago: 30,
        end_days_ahead: 60,
        city: None,
        value: 5,
        max_savings: Some(50),
    },
    RewardSpec {
        merchant: "Uber",
        reward_type: RewardType::PercentageCashback,
        label: "10% Cashback on Rides",
        description: "10% cashback on all Uber rides",
        category: "travel",
        terms: "Valid for all Uber rides. No maximum.",
        start_days_ago: 15,
        end_days_ahead: 45,
        city: None,
        value: 10,
        max_savings: None,
    },
    RewardSpec {
        merchant: "Whole Foods",
        reward_type: RewardType::PercentageCashback,
        label: "3% Cashback at Whole Foods",
        description: "3% cashback on grocery purchases",
        category: "groceries",
        terms: "Valid at Whole Foods Market locations.",
        start_days_ago: 20,
        end_days_ahead: 40,
        city: None,
        value: 3,
        max_savings: None,
    },
    RewardSpec {
        merchant: "Amazon",
        reward_type: RewardType::PercentageCashback,
        label: "2% Cashback on Amazon",
        description: "2% cashback on all Amazon purchases",
        category: "shopping",
        terms: "Valid on all Amazon.com purchases.",
        start_days_ago: 10,
        end_days_ahead: 50,
        city: None,
        value: 2,
        max_savings: None,
    },
    RewardSpec {
        merchant: "Exclusive Wine Tasting",
        reward_type: RewardType::Experience,
        label: "Priceless: Wine Tasting Experience",
        description: "Exclusive wine tasting at Napa Valley winery",
        category: "entertainment",
        terms: "Reservation required. Valid for cardholders in San Francisco area.",
        start_days_ago: 5,
        end_days_ahead: 30,
        city: Some("San Francisco"),
        value: 150,
        max_savings: None,
    },
    RewardSpec {
        merchant: "Broadway Show Tickets",
        reward_type: RewardType::Experience,
        label: "Priceless: Broadway Show Access",
        description: "VIP access to select Broadway shows",
        category: "entertainment",
        terms: "Subject to availability. New York area only.",
        start_days_ago: 3,
        end_days_ahead: 20,
        city: Some("New York"),
        value: 200,
        max_savings: None,
    },
    RewardSpec {
        merchant: "Coffee Shop",
        reward_type: RewardType::PercentageCashback,
        label: "4% Cashback at Coffee Shops",
        description: "4% cashback at participating coffee shops",
        category: "dining",
        terms: "Valid at independent coffee shops.",
        start_days_ago: 25,
        end_days_ahead: 35,
        city: None,
        value: 4,
        max_savings: None,
    },
];

/// Demo reward catalog, windows relative to `now`
pub fn demo_rewards(now: DateTime<Utc>) -> Vec<Reward> {
    REWARD_SPECS
        .iter()
        .zip(1..)
        .map(|(spec, id)| {
            let experience = spec.reward_type == RewardType::Experience;
            Reward {
                id,
                merchant_name: spec.merchant.to_string(),
                reward_type: spec.reward_type,
                label: spec.label.to_string(),
                description: Some(spec.description.to_string()),
                category: Some(spec.category.to_string()),
                terms: Some(spec.terms.to_string()),
                start_date: now - Duration::days(spec.start_days_ago),
                end_date: Some(now + Duration::days(spec.end_days_ahead)),
                max_savings_amount: spec.max_savings.map(Decimal::from),
                geo_scope: if spec.city.is_some() {
                    GeoScope::City
                } else {
                    GeoScope::Global
                },
                geo_country: None,
                geo_city: spec.city.map(String::from),
                is_auto_applicable: !experience,
                requires_opt_in: experience,
                percentage_value: (!experience).then(|| Decimal::from(spec.value)),
                fixed_amount_value: experience.then(|| Decimal::from(spec.value)),
            }
        })
        .collect()
}

/// Generate the full demo tables
pub fn generate(seed: u64, now: DateTime<Utc>) -> Result<Tables> {
    let mut rng = StdRng::seed_from_u64(seed);
    let enricher = Enricher::new()?;

    let users = demo_users();
    let preferences: Vec<Preferences> = users.iter().map(Preferences::defaults_for).collect();
    let rewards = demo_rewards(now);

    let mut transactions = Vec::new();
    let mut next_id = 1;

    for ((user, prefs), account_id) in users.iter().zip(&preferences).zip(2001..) {
        let location = effective_location(user, Some(prefs));

        for day in 0..HISTORY_DAYS {
            let transaction_at = now - Duration::days(day);

            for _ in 0..rng.gen_range(1..=3) {
                let (description, memo, base_cents) =
                    TRANSACTION_TEMPLATES[rng.gen_range(0..TRANSACTION_TEMPLATES.len())];

                // vary the amount by +/-20%, in basis points
                let factor: i64 = rng.gen_range(8_000..=12_000);
                let cents = (base_cents * factor) / 10_000;

                let mut tx = Transaction {
                    id: next_id,
                    user_id: user.id,
                    account_id,
                    posted_at: Some(transaction_at + Duration::hours(rng.gen_range(0..=24))),
                    transaction_at,
                    description: description.to_string(),
                    memo: Some(memo.to_string()),
                    amount: Decimal::new(cents, 2),
                    merchant: None,
                    category: None,
                    reward_applied: false,
                    matched_reward_id: None,
                    savings_amount: None,
                    notification_triggered: false,
                };
                next_id += 1;

                enricher.enrich(&mut tx);
                apply_rewards(&mut tx, location, prefs, &rewards, &mut rng);
                transactions.push(tx);
            }
        }
    }

    tracing::info!(
        seed,
        users = users.len(),
        rewards = rewards.len(),
        transactions = transactions.len(),
        "Generated demo data"
    );

    Ok(Tables {
        users,
        preferences,
        transactions,
        rewards,
    })
}

/// Record the first matching reward and decide whether it applied
fn apply_rewards(
    tx: &mut Transaction,
    location: Option<&str>,
    prefs: &Preferences,
    catalog: &[Reward],
    rng: &mut StdRng,
) {
    let Some(reward) = find_matching_rewards(tx, location, Some(prefs), catalog)
        .into_iter()
        .next()
    else {
        return;
    };

    tx.matched_reward_id = Some(reward.id);
    tx.savings_amount = Some(calculate_savings(tx, reward));

    if !prefs.auto_apply_rewards_enabled {
        return;
    }
    if reward.is_auto_apply() {
        tx.reward_applied = true;
    } else if rng.gen_range(0..100) < NOTIFICATION_ACCEPT_PERCENT {
        tx.notification_triggered = true;
        tx.reward_applied = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_is_reproducible() {
        let a = generate(42, now()).unwrap();
        let b = generate(42, now()).unwrap();
        assert_eq!(a.transactions, b.transactions);

        let c = generate(7, now()).unwrap();
        assert_ne!(a.transactions, c.transactions);
    }

    #[test]
    fn test_generate_shape() {
        let tables = generate(42, now()).unwrap();
        assert_eq!(tables.users.len(), 2);
        assert_eq!(tables.preferences.len(), 2);
        assert_eq!(tables.rewards.len(), 7);

        for user in &tables.users {
            let count = tables
                .transactions
                .iter()
                .filter(|t| t.user_id == user.id)
                .count() as i64;
            assert!((HISTORY_DAYS..=HISTORY_DAYS * 3).contains(&count));
        }

        for tx in &tables.transactions {
            tx.validate().unwrap();
            assert!(tx.merchant.is_some());
            assert!(tx.transaction_at <= now());
            assert!(tx.transaction_at > now() - Duration::days(HISTORY_DAYS));
        }
        assert!(tables.transactions.iter().any(|t| t.reward_applied));
    }

    #[test]
    fn test_demo_rewards_catalog() {
        let rewards = demo_rewards(now());
        let wine = &rewards[4];
        assert_eq!(wine.id, 5);
        assert_eq!(wine.geo_scope, GeoScope::City);
        assert!(wine.requires_opt_in && !wine.is_auto_applicable);
        assert_eq!(wine.fixed_amount_value, Some(Decimal::new(150, 0)));

        let starbucks = &rewards[0];
        assert_eq!(starbucks.max_savings_amount, Some(Decimal::new(50, 0)));
        assert_eq!(starbucks.percentage_value, Some(Decimal::new(5, 0)));
        assert!(starbucks.is_auto_apply());
    }

    #[test]
    fn test_generated_store_loads() {
        let tables = generate(1, now()).unwrap();
        assert!(crate::store::MemoryStore::from_tables(tables).is_ok());
    }
}
