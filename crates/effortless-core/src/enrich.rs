//! Transaction enrichment
//!
//! Bank feeds carry a free-text description and memo. Enrichment derives a
//! normalized merchant name and a high-level category from them using ordered
//! pattern tables; the first matching pattern wins.

use regex::Regex;

use crate::error::Result;
use crate::models::Transaction;

/// Merchant patterns: (regex, normalized name), checked in order
const MERCHANT_PATTERNS: &[(&str, &str)] = &[
    (r"starbucks", "Starbucks"),
    (r"\bsbux\b", "Starbucks"),
    (r"coffee", "Coffee Shop"),
    (r"mcdonald", "McDonald's"),
    (r"\bmcd\b", "McDonald's"),
    (r"\buber\b", "Uber"),
    (r"\blyft\b", "Lyft"),
    (r"amazon|\bamzn\b", "Amazon"),
    (r"whole\s*foods|wholefds", "Whole Foods"),
    (r"\btarget\b", "Target"),
    (r"walmart", "Walmart"),
    (r"restaurant|dining", "Restaurant"),
    (r"hotel", "Hotel"),
    (r"airline", "Airline"),
    (r"\bshell\b", "Shell"),
    (r"exxon", "Exxon"),
    (r"\bgas\b", "Gas Station"),
    (r"grocery", "Grocery Store"),
];

/// Category patterns: (regex, category), checked in order
const CATEGORY_PATTERNS: &[(&str, &str)] = &[
    (r"payroll|direct deposit|salary", "income"),
    (
        r"restaurant|cafe|coffee|starbucks|mcdonald|dining|\bfood\b|pizza|burger",
        "dining",
    ),
    (
        r"hotel|airline|\buber\b|\blyft\b|taxi|airport|travel|booking|flight",
        "travel",
    ),
    (
        r"grocery|whole\s*foods|safeway|kroger|walmart|\btarget\b|supermarket",
        "groceries",
    ),
    (
        r"movie|theater|cinema|netflix|spotify|entertainment|concert",
        "entertainment",
    ),
    (r"amazon|retail|store|shopping|\bmall\b", "shopping"),
    (r"electric|water|gas bill|utility|internet|phone", "utilities"),
    (r"\bgas\b|\bshell\b|exxon|chevron|\bbp\b|fuel", "gas"),
];

/// Pattern-based merchant and category inference
pub struct Enricher {
    merchants: Vec<(Regex, &'static str)>,
    categories: Vec<(Regex, &'static str)>,
}

impl Enricher {
    /// Compile the built-in pattern tables
    pub fn new() -> Result<Self> {
        Ok(Self {
            merchants: compile(MERCHANT_PATTERNS)?,
            categories: compile(CATEGORY_PATTERNS)?,
        })
    }

    /// Normalized merchant name from description + memo
    ///
    /// Falls back to the capitalized first word when no pattern matches.
    pub fn normalize_merchant(&self, description: &str, memo: Option<&str>) -> Option<String> {
        let combined = format!("{} {}", description, memo.unwrap_or(""));

        if let Some((_, name)) = self.merchants.iter().find(|(re, _)| re.is_match(&combined)) {
            return Some(name.to_string());
        }

        combined
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .find(|w| !w.is_empty())
            .map(capitalize)
    }

    /// High-level category from description, memo and merchant
    pub fn infer_category(
        &self,
        description: &str,
        memo: Option<&str>,
        merchant: Option<&str>,
    ) -> Option<String> {
        let combined = format!(
            "{} {} {}",
            description,
            memo.unwrap_or(""),
            merchant.unwrap_or("")
        );

        self.categories
            .iter()
            .find(|(re, _)| re.is_match(&combined))
            .map(|(_, category)| category.to_string())
    }

    /// Fill in missing merchant and category, leaving existing values alone
    pub fn enrich(&self, tx: &mut Transaction) {
        if tx.merchant.is_none() {
            tx.merchant = self.normalize_merchant(&tx.description, tx.memo.as_deref());
        }
        if tx.category.is_none() {
            tx.category =
                self.infer_category(&tx.description, tx.memo.as_deref(), tx.merchant.as_deref());
        }
    }
}

fn compile(patterns: &[(&str, &'static str)]) -> Result<Vec<(Regex, &'static str)>> {
    patterns
        .iter()
        .map(|(pattern, value)| Ok((Regex::new(&format!("(?i){}", pattern))?, *value)))
        .collect()
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_merchants() {
        let enricher = Enricher::new().unwrap();
        assert_eq!(
            enricher.normalize_merchant("STARBUCKS STORE #12345", None),
            Some("Starbucks".into())
        );
        assert_eq!(
            enricher.normalize_merchant("SBUX #67890", Some("Coffee purchase")),
            Some("Starbucks".into())
        );
        assert_eq!(
            enricher.normalize_merchant("UBER *RIDE", None),
            Some("Uber".into())
        );
        assert_eq!(
            enricher.normalize_merchant("WHOLE FOODS #SF", None),
            Some("Whole Foods".into())
        );
    }

    #[test]
    fn test_normalize_fallback_first_word() {
        let enricher = Enricher::new().unwrap();
        assert_eq!(
            enricher.normalize_merchant("NETFLIX", Some("Streaming subscription")),
            Some("Netflix".into())
        );
        assert_eq!(
            enricher.normalize_merchant("*PAYROLL DEPOSIT", None),
            Some("Payroll".into())
        );
        assert_eq!(enricher.normalize_merchant("   ", None), None);
    }

    #[test]
    fn test_short_patterns_need_word_boundaries() {
        let enricher = Enricher::new().unwrap();
        // "mcd" inside another word is not McDonald's
        assert_eq!(
            enricher.normalize_merchant("XMCDX SUPPLY", None),
            Some("Xmcdx".into())
        );
    }

    #[test]
    fn test_infer_category() {
        let enricher = Enricher::new().unwrap();
        assert_eq!(
            enricher.infer_category("MCDONALDS #111", None, None),
            Some("dining".into())
        );
        assert_eq!(
            enricher.infer_category("LYFT RIDE", None, Some("Lyft")),
            Some("travel".into())
        );
        assert_eq!(
            enricher.infer_category("AMAZON.COM", Some("Online purchase"), None),
            Some("shopping".into())
        );
        assert_eq!(
            enricher.infer_category("PG&E", Some("gas bill"), None),
            Some("utilities".into())
        );
        assert_eq!(
            enricher.infer_category("DIRECT DEPOSIT", Some("Monthly salary"), None),
            Some("income".into())
        );
        assert_eq!(
            enricher.infer_category("WHOLE FOODS MARKET", Some("Grocery purchase"), None),
            Some("groceries".into())
        );
        assert_eq!(enricher.infer_category("XYZZY", None, None), None);
    }

    #[test]
    fn test_enrich_keeps_existing_values() {
        use chrono::Utc;
        use rust_decimal::Decimal;

        let enricher = Enricher::new().unwrap();
        let mut tx = Transaction {
            id: 1,
            user_id: 1,
            account_id: 1,
            posted_at: None,
            transaction_at: Utc::now(),
            description: "STARBUCKS STORE".into(),
            memo: None,
            amount: Decimal::new(-550, 2),
            merchant: None,
            category: Some("coffee".into()),
            reward_applied: false,
            matched_reward_id: None,
            savings_amount: None,
            notification_triggered: false,
        };
        enricher.enrich(&mut tx);
        assert_eq!(tx.merchant.as_deref(), Some("Starbucks"));
        assert_eq!(tx.category.as_deref(), Some("coffee"));
    }
}
