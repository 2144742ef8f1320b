//! CSV table loading and writing
//!
//! A data directory holds `users.csv`, `preferences.csv`, `transactions.csv`
//! and `rewards.csv`. A missing file is an empty table. Rows are read as raw
//! strings first so errors can name the file and line that failed.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Tables;
use crate::enrich::Enricher;
use crate::error::{Error, Result};
use crate::models::{GeoScope, Preferences, Reward, RewardType, Transaction, User};

pub const USERS_FILE: &str = "users.csv";
pub const PREFERENCES_FILE: &str = "preferences.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const REWARDS_FILE: &str = "rewards.csv";

#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    id: String,
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    home_location: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferencesRow {
    user_id: String,
    #[serde(default)]
    notifications_enabled: String,
    #[serde(default)]
    priceless_notifications_enabled: String,
    #[serde(default)]
    auto_apply_rewards_enabled: String,
    #[serde(default)]
    geo_location: String,
    #[serde(default)]
    updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransactionRow {
    id: String,
    user_id: String,
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    posted_at: String,
    transaction_at: String,
    description: String,
    #[serde(default)]
    memo: String,
    amount: String,
    #[serde(default)]
    merchant: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    reward_applied: String,
    #[serde(default)]
    matched_reward_id: String,
    #[serde(default)]
    savings_amount: String,
    #[serde(default)]
    notification_triggered: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RewardRow {
    id: String,
    merchant_name: String,
    reward_type: String,
    label: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    terms: String,
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    max_savings_amount: String,
    #[serde(default)]
    geo_scope: String,
    #[serde(default)]
    geo_country: String,
    #[serde(default)]
    geo_city: String,
    #[serde(default)]
    is_auto_applicable: String,
    #[serde(default)]
    requires_opt_in: String,
    #[serde(default)]
    percentage_value: String,
    #[serde(default)]
    fixed_amount_value: String,
}

/// Location of a row, used in error messages
struct RowRef<'a> {
    file: &'a str,
    line: usize,
}

impl RowRef<'_> {
    fn invalid(&self, field: &str, value: &str, reason: impl std::fmt::Display) -> Error {
        Error::InvalidData(format!(
            "{}:{}: invalid {} '{}': {}",
            self.file, self.line, field, value, reason
        ))
    }

    fn id(&self, field: &str, value: &str) -> Result<i64> {
        value
            .trim()
            .parse()
            .map_err(|e| self.invalid(field, value, e))
    }

    fn opt_id(&self, field: &str, value: &str) -> Result<Option<i64>> {
        opt(value).map(|v| self.id(field, v)).transpose()
    }

    fn decimal(&self, field: &str, value: &str) -> Result<Decimal> {
        let cleaned = value.trim().replace(['$', ','], "");
        Decimal::from_str(&cleaned).map_err(|e| self.invalid(field, value, e))
    }

    fn opt_decimal(&self, field: &str, value: &str) -> Result<Option<Decimal>> {
        opt(value).map(|v| self.decimal(field, v)).transpose()
    }

    fn timestamp(&self, field: &str, value: &str) -> Result<DateTime<Utc>> {
        parse_timestamp(value).ok_or_else(|| self.invalid(field, value, "unrecognized date"))
    }

    fn opt_timestamp(&self, field: &str, value: &str) -> Result<Option<DateTime<Utc>>> {
        opt(value).map(|v| self.timestamp(field, v)).transpose()
    }

    fn flag(&self, field: &str, value: &str, default: bool) -> Result<bool> {
        match opt(value) {
            None => Ok(default),
            Some(v) => parse_bool(v).ok_or_else(|| self.invalid(field, value, "expected a boolean")),
        }
    }

    fn parsed<T: FromStr<Err = String>>(&self, field: &str, value: &str) -> Result<T> {
        value.parse().map_err(|e| self.invalid(field, value, e))
    }
}

/// Blank cells are absent values
fn opt(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn opt_string(value: &str) -> Option<String> {
    opt(value).map(String::from)
}

/// Parse a boolean cell: true/false, 1/0, yes/no, t/f, y/n
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a timestamp cell
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` or `YYYY-MM-DDTHH:MM:SS[.fff]`
/// (taken as UTC) and bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Read every row of a CSV file, or nothing when the file is absent
fn read_rows<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<(usize, T)>> {
    let path = dir.join(file);
    if !path.exists() {
        warn!("{} not found, using an empty table", path.display());
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(&path)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize().enumerate() {
        let row: T = record?;
        // header is line 1
        rows.push((idx + 2, row));
    }
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn parse_user(at: &RowRef, row: UserRow) -> Result<User> {
    Ok(User {
        id: at.id("id", &row.id)?,
        name: row.name.trim().to_string(),
        email: opt_string(&row.email),
        home_location: opt_string(&row.home_location),
    })
}

fn parse_preferences(at: &RowRef, row: PreferencesRow) -> Result<Preferences> {
    Ok(Preferences {
        user_id: at.id("user_id", &row.user_id)?,
        notifications_enabled: at.flag("notifications_enabled", &row.notifications_enabled, true)?,
        priceless_notifications_enabled: at.flag(
            "priceless_notifications_enabled",
            &row.priceless_notifications_enabled,
            true,
        )?,
        auto_apply_rewards_enabled: at.flag(
            "auto_apply_rewards_enabled",
            &row.auto_apply_rewards_enabled,
            true,
        )?,
        geo_location: opt_string(&row.geo_location),
        updated_at: at.opt_timestamp("updated_at", &row.updated_at)?,
    })
}

fn parse_transaction(at: &RowRef, row: TransactionRow) -> Result<Transaction> {
    let tx = Transaction {
        id: at.id("id", &row.id)?,
        user_id: at.id("user_id", &row.user_id)?,
        account_id: at.opt_id("account_id", &row.account_id)?.unwrap_or(0),
        posted_at: at.opt_timestamp("posted_at", &row.posted_at)?,
        transaction_at: at.timestamp("transaction_at", &row.transaction_at)?,
        description: row.description.trim().to_string(),
        memo: opt_string(&row.memo),
        amount: at.decimal("amount", &row.amount)?,
        merchant: opt_string(&row.merchant),
        category: opt_string(&row.category),
        reward_applied: at.flag("reward_applied", &row.reward_applied, false)?,
        matched_reward_id: at.opt_id("matched_reward_id", &row.matched_reward_id)?,
        savings_amount: at.opt_decimal("savings_amount", &row.savings_amount)?,
        notification_triggered: at.flag(
            "notification_triggered",
            &row.notification_triggered,
            false,
        )?,
    };

    tx.validate()
        .map_err(|e| Error::InvalidData(format!("{}:{}: {}", at.file, at.line, e)))?;
    Ok(tx)
}

fn parse_reward(at: &RowRef, row: RewardRow) -> Result<Reward> {
    Ok(Reward {
        id: at.id("id", &row.id)?,
        merchant_name: row.merchant_name.trim().to_string(),
        reward_type: at.parsed::<RewardType>("reward_type", &row.reward_type)?,
        label: row.label.trim().to_string(),
        description: opt_string(&row.description),
        category: opt_string(&row.category),
        terms: opt_string(&row.terms),
        start_date: at.timestamp("start_date", &row.start_date)?,
        end_date: at.opt_timestamp("end_date", &row.end_date)?,
        max_savings_amount: at.opt_decimal("max_savings_amount", &row.max_savings_amount)?,
        geo_scope: at.parsed::<GeoScope>("geo_scope", &row.geo_scope)?,
        geo_country: opt_string(&row.geo_country),
        geo_city: opt_string(&row.geo_city),
        is_auto_applicable: at.flag("is_auto_applicable", &row.is_auto_applicable, false)?,
        requires_opt_in: at.flag("requires_opt_in", &row.requires_opt_in, false)?,
        percentage_value: at.opt_decimal("percentage_value", &row.percentage_value)?,
        fixed_amount_value: at.opt_decimal("fixed_amount_value", &row.fixed_amount_value)?,
    })
}

fn parse_all<R, T>(
    dir: &Path,
    file: &str,
    parse: impl Fn(&RowRef, R) -> Result<T>,
) -> Result<Vec<T>>
where
    R: DeserializeOwned,
{
    read_rows::<R>(dir, file)?
        .into_iter()
        .map(|(line, row)| parse(&RowRef { file, line }, row))
        .collect()
}

/// Load all four tables from a data directory
///
/// Transactions missing a merchant or category are enriched on the way in.
pub fn load_dir(dir: &Path) -> Result<Tables> {
    let users = parse_all(dir, USERS_FILE, parse_user)?;
    let preferences = parse_all(dir, PREFERENCES_FILE, parse_preferences)?;
    let mut transactions = parse_all(dir, TRANSACTIONS_FILE, parse_transaction)?;
    let rewards = parse_all(dir, REWARDS_FILE, parse_reward)?;

    let enricher = Enricher::new()?;
    for tx in &mut transactions {
        enricher.enrich(tx);
    }

    info!(
        users = users.len(),
        transactions = transactions.len(),
        rewards = rewards.len(),
        "Loaded data from {}",
        dir.display()
    );

    Ok(Tables {
        users,
        preferences,
        transactions,
        rewards,
    })
}

fn write_rows<T: Serialize>(dir: &Path, file: &str, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join(file))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write all four tables into a data directory, creating it when needed
pub fn write_dir(dir: &Path, tables: &Tables) -> Result<()> {
    fs::create_dir_all(dir)?;

    write_rows(
        dir,
        USERS_FILE,
        tables.users.iter().map(|u| UserRow {
            id: u.id.to_string(),
            name: u.name.clone(),
            email: format_opt(&u.email),
            home_location: format_opt(&u.home_location),
        }),
    )?;

    write_rows(
        dir,
        PREFERENCES_FILE,
        tables.preferences.iter().map(|p| PreferencesRow {
            user_id: p.user_id.to_string(),
            notifications_enabled: p.notifications_enabled.to_string(),
            priceless_notifications_enabled: p.priceless_notifications_enabled.to_string(),
            auto_apply_rewards_enabled: p.auto_apply_rewards_enabled.to_string(),
            geo_location: format_opt(&p.geo_location),
            updated_at: p.updated_at.as_ref().map(format_timestamp).unwrap_or_default(),
        }),
    )?;

    write_rows(
        dir,
        TRANSACTIONS_FILE,
        tables.transactions.iter().map(|t| TransactionRow {
            id: t.id.to_string(),
            user_id: t.user_id.to_string(),
            account_id: t.account_id.to_string(),
            posted_at: t.posted_at.as_ref().map(format_timestamp).unwrap_or_default(),
            transaction_at: format_timestamp(&t.transaction_at),
            description: t.description.clone(),
            memo: format_opt(&t.memo),
            amount: t.amount.to_string(),
            merchant: format_opt(&t.merchant),
            category: format_opt(&t.category),
            reward_applied: t.reward_applied.to_string(),
            matched_reward_id: format_opt(&t.matched_reward_id),
            savings_amount: format_opt(&t.savings_amount),
            notification_triggered: t.notification_triggered.to_string(),
        }),
    )?;

    write_rows(
        dir,
        REWARDS_FILE,
        tables.rewards.iter().map(|r| RewardRow {
            id: r.id.to_string(),
            merchant_name: r.merchant_name.clone(),
            reward_type: r.reward_type.to_string(),
            label: r.label.clone(),
            description: format_opt(&r.description),
            category: format_opt(&r.category),
            terms: format_opt(&r.terms),
            start_date: format_timestamp(&r.start_date),
            end_date: r.end_date.as_ref().map(format_timestamp).unwrap_or_default(),
            max_savings_amount: format_opt(&r.max_savings_amount),
            geo_scope: r.geo_scope.to_string(),
            geo_country: format_opt(&r.geo_country),
            geo_city: format_opt(&r.geo_city),
            is_auto_applicable: r.is_auto_applicable.to_string(),
            requires_opt_in: r.requires_opt_in.to_string(),
            percentage_value: format_opt(&r.percentage_value),
            fixed_amount_value: format_opt(&r.fixed_amount_value),
        }),
    )?;

    info!("Wrote data to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 4, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-04T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04 10:30:00.000000"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-04"),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("03/04/2025"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_missing_files_give_empty_tables() {
        let dir = TempDir::new().unwrap();
        let tables = load_dir(dir.path()).unwrap();
        assert!(tables.users.is_empty());
        assert!(tables.preferences.is_empty());
        assert!(tables.transactions.is_empty());
        assert!(tables.rewards.is_empty());
    }

    #[test]
    fn test_load_enriches_transactions() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            USERS_FILE,
            "id,name,email,home_location\n1001,Sarah Johnson,sarah@example.com,\"San Francisco, CA\"\n",
        );
        write(
            dir.path(),
            TRANSACTIONS_FILE,
            "id,user_id,account_id,transaction_at,description,memo,amount\n\
             1,1001,3001,2025-03-04 10:30:00,SBUX #67890,Coffee purchase,-4.75\n",
        );

        let tables = load_dir(dir.path()).unwrap();
        assert_eq!(tables.users[0].home_location.as_deref(), Some("San Francisco, CA"));
        let tx = &tables.transactions[0];
        assert_eq!(tx.amount, Decimal::new(-475, 2));
        assert_eq!(tx.merchant.as_deref(), Some("Starbucks"));
        assert_eq!(tx.category.as_deref(), Some("dining"));
        assert!(!tx.reward_applied);
        assert!(tx.posted_at.is_none());
    }

    #[test]
    fn test_load_rejects_applied_without_savings() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            TRANSACTIONS_FILE,
            "id,user_id,transaction_at,description,amount,reward_applied,matched_reward_id\n\
             9,1001,2025-03-04,STARBUCKS,-5.00,true,1\n",
        );

        let err = load_dir(dir.path()).unwrap_err().to_string();
        assert!(err.contains("transactions.csv:2"), "{}", err);
        assert!(err.contains("savings_amount"), "{}", err);
    }

    #[test]
    fn test_load_reports_bad_cells() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            REWARDS_FILE,
            "id,merchant_name,reward_type,label,start_date\n1,Starbucks,voucher,5% back,2025-01-01\n",
        );
        let err = load_dir(dir.path()).unwrap_err().to_string();
        assert!(err.contains("rewards.csv:2"), "{}", err);
        assert!(err.contains("reward_type"), "{}", err);
    }

    #[test]
    fn test_write_then_load_preserves_tables() {
        let dir = TempDir::new().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 10, 30, 0).unwrap();
        let tables = Tables {
            users: vec![User {
                id: 1002,
                name: "Michael Chen".into(),
                email: None,
                home_location: Some("New York, NY".into()),
            }],
            preferences: vec![],
            transactions: vec![Transaction {
                id: 1,
                user_id: 1002,
                account_id: 3002,
                posted_at: Some(at),
                transaction_at: at,
                description: "UBER TRIP".into(),
                memo: Some("Ride share, airport".into()),
                amount: Decimal::new(-1850, 2),
                merchant: Some("Uber".into()),
                category: Some("travel".into()),
                reward_applied: true,
                matched_reward_id: Some(2),
                savings_amount: Some(Decimal::new(185, 2)),
                notification_triggered: false,
            }],
            rewards: vec![Reward {
                id: 2,
                merchant_name: "Uber".into(),
                reward_type: RewardType::PercentageCashback,
                label: "10% Cashback on Rides".into(),
                description: None,
                category: Some("travel".into()),
                terms: None,
                start_date: at,
                end_date: None,
                max_savings_amount: None,
                geo_scope: GeoScope::Global,
                geo_country: None,
                geo_city: None,
                is_auto_applicable: true,
                requires_opt_in: false,
                percentage_value: Some(Decimal::new(10, 0)),
                fixed_amount_value: None,
            }],
        };

        write_dir(dir.path(), &tables).unwrap();
        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.users, tables.users);
        assert_eq!(loaded.transactions, tables.transactions);
        assert_eq!(loaded.rewards, tables.rewards);
    }
}
