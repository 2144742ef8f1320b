//! Domain models for Effortless

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest accepted preference geo-location
pub const MAX_GEO_LOCATION_LEN: usize = 200;

/// A cardholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    /// Free text such as "San Francisco, CA"
    pub home_location: Option<String>,
}

/// Notification and reward preferences, one per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub user_id: i64,
    pub notifications_enabled: bool,
    pub priceless_notifications_enabled: bool,
    pub auto_apply_rewards_enabled: bool,
    /// Location used for "Priceless" experiences, overrides the home location
    pub geo_location: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Preferences {
    /// Preferences reported for a user who never saved any
    pub fn defaults_for(user: &User) -> Self {
        Self {
            user_id: user.id,
            notifications_enabled: true,
            priceless_notifications_enabled: true,
            auto_apply_rewards_enabled: true,
            geo_location: user.home_location.clone(),
            updated_at: None,
        }
    }
}

/// Replacement body for a user's preferences
///
/// Every flag is required: a replace never merges with the stored value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferencesUpdate {
    pub notifications_enabled: bool,
    pub priceless_notifications_enabled: bool,
    pub auto_apply_rewards_enabled: bool,
    #[serde(default)]
    pub geo_location: Option<String>,
}

impl PreferencesUpdate {
    /// Validate and turn the update into a full preferences record
    pub fn into_preferences(self, user_id: i64, now: DateTime<Utc>) -> Result<Preferences> {
        let geo_location = match self.geo_location {
            Some(geo) => {
                let geo = geo.trim();
                if geo.len() > MAX_GEO_LOCATION_LEN {
                    return Err(Error::Validation(format!(
                        "geo_location must be at most {} characters",
                        MAX_GEO_LOCATION_LEN
                    )));
                }
                (!geo.is_empty()).then(|| geo.to_string())
            }
            None => None,
        };

        Ok(Preferences {
            user_id,
            notifications_enabled: self.notifications_enabled,
            priceless_notifications_enabled: self.priceless_notifications_enabled,
            auto_apply_rewards_enabled: self.auto_apply_rewards_enabled,
            geo_location,
            updated_at: Some(now),
        })
    }
}

/// A card transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub posted_at: Option<DateTime<Utc>>,
    pub transaction_at: DateTime<Utc>,
    pub description: String,
    pub memo: Option<String>,
    /// Signed USD amount (negative = spend)
    pub amount: Decimal,
    /// Normalized merchant name
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub reward_applied: bool,
    /// Reward this transaction matched, applied or not
    pub matched_reward_id: Option<i64>,
    pub savings_amount: Option<Decimal>,
    /// The applied reward was surfaced through a notification
    pub notification_triggered: bool,
}

impl Transaction {
    /// Matched to a reward that never applied
    pub fn is_missed(&self) -> bool {
        self.matched_reward_id.is_some() && !self.reward_applied
    }

    /// Savings realized, zero when nothing applied
    pub fn realized_savings(&self) -> Decimal {
        if self.reward_applied {
            self.savings_amount.unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }

    /// Check that an applied reward carries its savings and reward reference
    pub fn validate(&self) -> Result<()> {
        if self.reward_applied {
            if self.savings_amount.is_none() {
                return Err(Error::InvalidData(format!(
                    "transaction {} has reward_applied but no savings_amount",
                    self.id
                )));
            }
            if self.matched_reward_id.is_none() {
                return Err(Error::InvalidData(format!(
                    "transaction {} has reward_applied but no matched_reward_id",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// Kind of reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    PercentageCashback,
    FixedAmount,
    /// "Priceless" experience
    Experience,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PercentageCashback => "percentage_cashback",
            Self::FixedAmount => "fixed_amount",
            Self::Experience => "experience",
        }
    }
}

impl std::str::FromStr for RewardType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage_cashback" | "percentage" | "cashback" => Ok(Self::PercentageCashback),
            "fixed_amount" | "fixed" => Ok(Self::FixedAmount),
            "experience" | "priceless" => Ok(Self::Experience),
            _ => Err(format!("Unknown reward type: {}", s)),
        }
    }
}

impl std::fmt::Display for RewardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Geographic applicability tier of a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoScope {
    Global,
    Country,
    City,
}

impl GeoScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Country => "country",
            Self::City => "city",
        }
    }

    /// Ranking weight, more specific scopes rank first
    pub fn specificity(&self) -> u8 {
        match self {
            Self::Global => 0,
            Self::Country => 1,
            Self::City => 2,
        }
    }
}

impl std::str::FromStr for GeoScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" | "" => Ok(Self::Global),
            "country" => Ok(Self::Country),
            "city" => Ok(Self::City),
            _ => Err(format!("Unknown geo scope: {}", s)),
        }
    }
}

impl std::fmt::Display for GeoScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog entry: merchant offer or "Priceless" experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: i64,
    pub merchant_name: String,
    pub reward_type: RewardType,
    pub label: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub terms: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_savings_amount: Option<Decimal>,
    pub geo_scope: GeoScope,
    pub geo_country: Option<String>,
    pub geo_city: Option<String>,
    pub is_auto_applicable: bool,
    pub requires_opt_in: bool,
    pub percentage_value: Option<Decimal>,
    pub fixed_amount_value: Option<Decimal>,
}

impl Reward {
    /// Applicability window contains `at` (end date inclusive)
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && self.end_date.map_or(true, |end| end >= at)
    }

    /// Applies silently, without user enrollment
    pub fn is_auto_apply(&self) -> bool {
        self.is_auto_applicable && !self.requires_opt_in
    }

    /// Opt-in ("Priceless") reward surfaced via notification
    pub fn is_priceless(&self) -> bool {
        self.requires_opt_in || self.reward_type == RewardType::Experience
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reward(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Reward {
        Reward {
            id: 1,
            merchant_name: "Starbucks".into(),
            reward_type: RewardType::PercentageCashback,
            label: "5% back".into(),
            description: None,
            category: Some("dining".into()),
            terms: None,
            start_date: start,
            end_date: end,
            max_savings_amount: None,
            geo_scope: GeoScope::Global,
            geo_country: None,
            geo_city: None,
            is_auto_applicable: true,
            requires_opt_in: false,
            percentage_value: Some(Decimal::new(5, 0)),
            fixed_amount_value: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_reward_active_window() {
        let now = now();
        assert!(reward(now - Duration::days(1), None).is_active_at(now));
        assert!(reward(now - Duration::days(1), Some(now)).is_active_at(now));
        assert!(!reward(now - Duration::days(10), Some(now - Duration::days(1))).is_active_at(now));
        assert!(!reward(now + Duration::days(1), None).is_active_at(now));
    }

    #[test]
    fn test_reward_type_parse() {
        assert_eq!(
            "percentage_cashback".parse::<RewardType>().unwrap(),
            RewardType::PercentageCashback
        );
        assert_eq!("Experience".parse::<RewardType>().unwrap(), RewardType::Experience);
        assert!("voucher".parse::<RewardType>().is_err());
    }

    #[test]
    fn test_geo_scope_specificity() {
        assert!(GeoScope::City.specificity() > GeoScope::Country.specificity());
        assert!(GeoScope::Country.specificity() > GeoScope::Global.specificity());
        assert_eq!("".parse::<GeoScope>().unwrap(), GeoScope::Global);
    }

    #[test]
    fn test_transaction_validate() {
        let mut tx = Transaction {
            id: 7,
            user_id: 1,
            account_id: 1,
            posted_at: None,
            transaction_at: now(),
            description: "STARBUCKS".into(),
            memo: None,
            amount: Decimal::new(-550, 2),
            merchant: None,
            category: None,
            reward_applied: true,
            matched_reward_id: Some(1),
            savings_amount: None,
            notification_triggered: false,
        };
        assert!(tx.validate().is_err());

        tx.savings_amount = Some(Decimal::new(28, 2));
        assert!(tx.validate().is_ok());

        tx.matched_reward_id = None;
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_preferences_defaults_use_home_location() {
        let user = User {
            id: 1001,
            name: "Sarah Johnson".into(),
            email: None,
            home_location: Some("San Francisco, CA".into()),
        };
        let prefs = Preferences::defaults_for(&user);
        assert!(prefs.notifications_enabled);
        assert!(prefs.auto_apply_rewards_enabled);
        assert_eq!(prefs.geo_location.as_deref(), Some("San Francisco, CA"));
        assert!(prefs.updated_at.is_none());
    }

    #[test]
    fn test_preferences_update_rejects_wrong_types() {
        let body = r#"{"notifications_enabled": "yes", "priceless_notifications_enabled": true, "auto_apply_rewards_enabled": true}"#;
        assert!(serde_json::from_str::<PreferencesUpdate>(body).is_err());

        let missing = r#"{"notifications_enabled": true}"#;
        assert!(serde_json::from_str::<PreferencesUpdate>(missing).is_err());
    }

    #[test]
    fn test_preferences_update_trims_geo() {
        let body = r#"{"notifications_enabled": false, "priceless_notifications_enabled": true, "auto_apply_rewards_enabled": true, "geo_location": "  New York, NY "}"#;
        let update: PreferencesUpdate = serde_json::from_str(body).unwrap();
        let prefs = update.into_preferences(1002, now()).unwrap();
        assert_eq!(prefs.geo_location.as_deref(), Some("New York, NY"));
        assert!(!prefs.notifications_enabled);
        assert_eq!(prefs.updated_at, Some(now()));
    }

    #[test]
    fn test_preferences_update_rejects_long_geo() {
        let update = PreferencesUpdate {
            notifications_enabled: true,
            priceless_notifications_enabled: true,
            auto_apply_rewards_enabled: true,
            geo_location: Some("x".repeat(MAX_GEO_LOCATION_LEN + 1)),
        };
        assert!(matches!(
            update.into_preferences(1, now()),
            Err(Error::Validation(_))
        ));
    }
}
