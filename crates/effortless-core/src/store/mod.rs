//! Data store: repository trait and the in-memory implementation
//!
//! This module is organized as:
//! - `Repository` - lookup-by-id, list-with-filter and replace operations
//! - `MemoryStore` - immutable snapshot of users/transactions/rewards plus
//!   a lock-guarded preferences table
//! - `flatfile` - loading and writing the CSV tables

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{Preferences, Reward, Transaction, User};

pub mod flatfile;

/// Filter for transaction listings
///
/// Results are ordered newest first (`transaction_at` descending, then id
/// descending).
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<i64>,
    pub limit: Option<usize>,
    pub offset: usize,
    /// Only transactions at or after this instant
    pub since: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    /// Create a new filter builder
    pub fn new() -> Self {
        Self::default()
    }

    /// All transactions of one user
    pub fn for_user(user_id: i64) -> Self {
        Self::new().user_id(Some(user_id))
    }

    pub fn user_id(mut self, id: Option<i64>) -> Self {
        self.user_id = id;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }

    fn matches(&self, tx: &Transaction) -> bool {
        self.user_id.map_or(true, |id| tx.user_id == id)
            && self.since.map_or(true, |since| tx.transaction_at >= since)
    }
}

/// Filter for reward catalog listings, ordered by id
#[derive(Debug, Clone, Default)]
pub struct RewardFilter {
    /// Only rewards whose applicability window contains this instant
    pub active_at: Option<DateTime<Utc>>,
    /// Case-insensitive category match
    pub category: Option<String>,
}

impl RewardFilter {
    /// Create a new filter builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.active_at = at;
        self
    }

    pub fn category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(String::from);
        self
    }

    fn matches(&self, reward: &Reward) -> bool {
        let active = self.active_at.map_or(true, |at| reward.is_active_at(at));
        let category = match &self.category {
            Some(c) => reward
                .category
                .as_deref()
                .is_some_and(|rc| rc.eq_ignore_ascii_case(c)),
            None => true,
        };
        active && category
    }
}

/// Storage abstraction used by the aggregation and insight layers
pub trait Repository: Send + Sync {
    fn get_user(&self, id: i64) -> Result<Option<User>>;

    fn list_users(&self) -> Result<Vec<User>>;

    /// Stored preferences, `None` when the user never saved any
    fn get_preferences(&self, user_id: i64) -> Result<Option<Preferences>>;

    /// Replace a user's preferences as a whole
    fn replace_preferences(&self, prefs: Preferences) -> Result<Preferences>;

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Number of transactions matching the filter, ignoring limit/offset
    fn count_transactions(&self, filter: &TransactionFilter) -> Result<usize>;

    fn get_reward(&self, id: i64) -> Result<Option<Reward>>;

    fn list_rewards(&self, filter: &RewardFilter) -> Result<Vec<Reward>>;

    /// Look up a user, reporting unknown ids as not found
    fn require_user(&self, id: i64) -> Result<User> {
        self.get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))
    }

    /// Stored preferences, or the defaults derived from the user
    fn effective_preferences(&self, user: &User) -> Result<Preferences> {
        Ok(self
            .get_preferences(user.id)?
            .unwrap_or_else(|| Preferences::defaults_for(user)))
    }
}

/// Raw table contents as loaded from (or written to) flat files
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub preferences: Vec<Preferences>,
    pub transactions: Vec<Transaction>,
    pub rewards: Vec<Reward>,
}

/// In-memory repository
///
/// Users, transactions and rewards are immutable after construction.
/// Preferences sit behind a `RwLock`, so a reader sees either the old or the
/// new record, never a mix.
pub struct MemoryStore {
    users: BTreeMap<i64, User>,
    /// Sorted newest first
    transactions: Vec<Transaction>,
    /// Sorted by id
    rewards: Vec<Reward>,
    preferences: RwLock<HashMap<i64, Preferences>>,
}

impl MemoryStore {
    /// Store with no data
    pub fn empty() -> Self {
        Self {
            users: BTreeMap::new(),
            transactions: Vec::new(),
            rewards: Vec::new(),
            preferences: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store from loaded tables, validating ids and invariants
    pub fn from_tables(tables: Tables) -> Result<Self> {
        let mut users = BTreeMap::new();
        for user in tables.users {
            if users.insert(user.id, user.clone()).is_some() {
                return Err(Error::InvalidData(format!("duplicate user id {}", user.id)));
            }
        }

        let mut preferences = HashMap::new();
        for prefs in tables.preferences {
            if !users.contains_key(&prefs.user_id) {
                return Err(Error::InvalidData(format!(
                    "preferences reference unknown user {}",
                    prefs.user_id
                )));
            }
            preferences.insert(prefs.user_id, prefs);
        }

        let mut rewards = tables.rewards;
        rewards.sort_by_key(|r| r.id);
        if let Some(pair) = rewards.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(Error::InvalidData(format!(
                "duplicate reward id {}",
                pair[0].id
            )));
        }

        let mut seen = HashSet::new();
        for tx in &tables.transactions {
            tx.validate()?;
            if !seen.insert(tx.id) {
                return Err(Error::InvalidData(format!(
                    "duplicate transaction id {}",
                    tx.id
                )));
            }
        }

        let mut transactions = tables.transactions;
        transactions.sort_by(|a, b| {
            b.transaction_at
                .cmp(&a.transaction_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(Self {
            users,
            transactions,
            rewards,
            preferences: RwLock::new(preferences),
        })
    }

    /// Load a store from a directory of CSV files
    pub fn load(dir: &std::path::Path) -> Result<Self> {
        Self::from_tables(flatfile::load_dir(dir)?)
    }

    /// Copy of the current contents
    pub fn tables(&self) -> Result<Tables> {
        let mut preferences: Vec<Preferences> = self.read_prefs()?.values().cloned().collect();
        preferences.sort_by_key(|p| p.user_id);

        Ok(Tables {
            users: self.users.values().cloned().collect(),
            preferences,
            transactions: self.transactions.clone(),
            rewards: self.rewards.clone(),
        })
    }

    fn read_prefs(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<i64, Preferences>>> {
        self.preferences
            .read()
            .map_err(|_| Error::InvalidData("Failed to acquire preferences lock".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl Repository for MemoryStore {
    fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.values().cloned().collect())
    }

    fn get_preferences(&self, user_id: i64) -> Result<Option<Preferences>> {
        Ok(self.read_prefs()?.get(&user_id).cloned())
    }

    fn replace_preferences(&self, prefs: Preferences) -> Result<Preferences> {
        if !self.users.contains_key(&prefs.user_id) {
            return Err(Error::NotFound(format!("user {}", prefs.user_id)));
        }

        let mut table = self
            .preferences
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire preferences lock".into()))?;
        table.insert(prefs.user_id, prefs.clone());
        Ok(prefs)
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let matching = self
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .skip(filter.offset);

        Ok(match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    fn count_transactions(&self, filter: &TransactionFilter) -> Result<usize> {
        Ok(self
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .count())
    }

    fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        Ok(self
            .rewards
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|idx| self.rewards[idx].clone()))
    }

    fn list_rewards(&self, filter: &RewardFilter) -> Result<Vec<Reward>> {
        Ok(self
            .rewards
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoScope, RewardType};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn user(id: i64) -> User {
        User {
            id,
            name: format!("User {}", id),
            email: None,
            home_location: Some("San Francisco, CA".into()),
        }
    }

    fn tx(id: i64, user_id: i64, days_ago: i64) -> Transaction {
        Transaction {
            id,
            user_id,
            account_id: 2000 + user_id,
            posted_at: None,
            transaction_at: now() - Duration::days(days_ago),
            description: "STARBUCKS".into(),
            memo: None,
            amount: Decimal::new(-500, 2),
            merchant: Some("Starbucks".into()),
            category: Some("dining".into()),
            reward_applied: false,
            matched_reward_id: None,
            savings_amount: None,
            notification_triggered: false,
        }
    }

    fn reward(id: i64, category: &str, end: Option<DateTime<Utc>>) -> Reward {
        Reward {
            id,
            merchant_name: "Starbucks".into(),
            reward_type: RewardType::PercentageCashback,
            label: "5% back".into(),
            description: None,
            category: Some(category.into()),
            terms: None,
            start_date: now() - Duration::days(30),
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

    fn store() -> MemoryStore {
        MemoryStore::from_tables(Tables {
            users: vec![user(1), user(2)],
            preferences: vec![],
            transactions: vec![tx(1, 1, 5), tx(2, 1, 1), tx(3, 2, 2), tx(4, 1, 1)],
            rewards: vec![
                reward(2, "travel", None),
                reward(1, "dining", Some(now() - Duration::days(1))),
            ],
        })
        .unwrap()
    }

    #[test]
    fn test_list_transactions_newest_first() {
        let store = store();
        let txs = store
            .list_transactions(&TransactionFilter::for_user(1))
            .unwrap();
        let ids: Vec<i64> = txs.iter().map(|t| t.id).collect();
        // ties on time break by id descending
        assert_eq!(ids, vec![4, 2, 1]);
    }

    #[test]
    fn test_list_transactions_limit_offset() {
        let store = store();
        let filter = TransactionFilter::for_user(1).limit(Some(1)).offset(1);
        let ids: Vec<i64> = store
            .list_transactions(&filter)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(store.count_transactions(&filter).unwrap(), 3);

        let zero = TransactionFilter::for_user(1).limit(Some(0));
        assert!(store.list_transactions(&zero).unwrap().is_empty());
    }

    #[test]
    fn test_list_transactions_since() {
        let store = store();
        let filter = TransactionFilter::for_user(1).since(Some(now() - Duration::days(2)));
        assert_eq!(store.list_transactions(&filter).unwrap().len(), 2);
    }

    #[test]
    fn test_list_rewards_active_and_category() {
        let store = store();
        let all = store.list_rewards(&RewardFilter::new()).unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        let active = store
            .list_rewards(&RewardFilter::new().active_at(Some(now())))
            .unwrap();
        assert_eq!(active.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);

        let dining = store
            .list_rewards(&RewardFilter::new().category(Some("DINING")))
            .unwrap();
        assert_eq!(dining.len(), 1);
        assert_eq!(dining[0].id, 1);

        assert!(store.get_reward(2).unwrap().is_some());
        assert!(store.get_reward(99).unwrap().is_none());
    }

    #[test]
    fn test_require_user_not_found() {
        let store = store();
        assert!(store.require_user(1).is_ok());
        assert!(matches!(store.require_user(42), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_replace_preferences() {
        let store = store();
        let u = store.require_user(1).unwrap();
        assert!(store.get_preferences(1).unwrap().is_none());
        assert!(store.effective_preferences(&u).unwrap().notifications_enabled);

        let mut prefs = Preferences::defaults_for(&u);
        prefs.notifications_enabled = false;
        store.replace_preferences(prefs.clone()).unwrap();
        assert_eq!(store.get_preferences(1).unwrap(), Some(prefs.clone()));

        prefs.user_id = 42;
        assert!(matches!(
            store.replace_preferences(prefs),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_rejects_applied_reward_without_savings() {
        let mut bad = tx(1, 1, 0);
        bad.reward_applied = true;
        bad.matched_reward_id = Some(1);
        let result = MemoryStore::from_tables(Tables {
            users: vec![user(1)],
            transactions: vec![bad],
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = MemoryStore::from_tables(Tables {
            users: vec![user(1), user(1)],
            ..Default::default()
        });
        assert!(result.is_err());

        let result = MemoryStore::from_tables(Tables {
            users: vec![user(1)],
            transactions: vec![tx(1, 1, 0), tx(1, 1, 1)],
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_concurrent_readers_see_whole_preferences() {
        let store = Arc::new(store());
        let u = store.require_user(1).unwrap();
        let on = Preferences::defaults_for(&u);
        let mut off = on.clone();
        off.notifications_enabled = false;
        off.priceless_notifications_enabled = false;
        off.auto_apply_rewards_enabled = false;

        let writer = {
            let store = store.clone();
            let (on, off) = (on.clone(), off.clone());
            std::thread::spawn(move || {
                for i in 0..200 {
                    let next = if i % 2 == 0 { off.clone() } else { on.clone() };
                    store.replace_preferences(next).unwrap();
                }
            })
        };

        for _ in 0..200 {
            if let Some(p) = store.get_preferences(1).unwrap() {
                // all three flags flip together
                assert_eq!(p.notifications_enabled, p.priceless_notifications_enabled);
                assert_eq!(p.notifications_enabled, p.auto_apply_rewards_enabled);
            }
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_empty_store() {
        let store = MemoryStore::empty();
        assert!(store.list_users().unwrap().is_empty());
        assert!(store
            .list_transactions(&TransactionFilter::new())
            .unwrap()
            .is_empty());
        assert!(store.list_rewards(&RewardFilter::new()).unwrap().is_empty());
    }
}
