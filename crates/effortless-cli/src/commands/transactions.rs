//! Transaction command implementations

use std::path::Path;

use anyhow::Result;
use effortless_core::{Repository, TransactionFilter};

use super::{colored_amount, open_store, truncate};

pub fn cmd_transactions(data_dir: &Path, user_id: i64, limit: usize) -> Result<()> {
    let store = open_store(data_dir)?;
    store.require_user(user_id)?;

    let filter = TransactionFilter::for_user(user_id).limit(Some(limit));
    let transactions = store.list_transactions(&filter)?;

    if transactions.is_empty() {
        println!("No transactions found for user {}.", user_id);
        return Ok(());
    }

    let total = store.count_transactions(&filter)?;

    println!();
    println!("📝 Recent Transactions ({} of {})", transactions.len(), total);
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let reward = match (tx.reward_applied, tx.matched_reward_id) {
            (true, _) => " 🎁",
            (false, Some(_)) => " ⚠️",
            _ => "",
        };

        println!(
            "   {} │ {:>10} │ {:<12} │ {}{}",
            tx.transaction_at.format("%Y-%m-%d"),
            colored_amount(tx.amount),
            tx.category.as_deref().unwrap_or("-"),
            truncate(tx.merchant.as_deref().unwrap_or(&tx.description), 32),
            reward
        );
    }

    Ok(())
}
