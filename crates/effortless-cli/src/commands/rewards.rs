//! Reward catalog command

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use effortless_core::{Repository, RewardFilter};

use super::{open_store, truncate};

pub fn cmd_rewards(data_dir: &Path, all: bool, category: Option<&str>) -> Result<()> {
    let store = open_store(data_dir)?;
    let filter = RewardFilter::new()
        .active_at((!all).then(Utc::now))
        .category(category);
    let rewards = store.list_rewards(&filter)?;

    if rewards.is_empty() {
        println!("No rewards found.");
        return Ok(());
    }

    println!();
    println!("🎁 Rewards{}", if all { "" } else { " (active)" });
    println!("   ─────────────────────────────────────────────────────────────");

    for reward in rewards {
        let how = if reward.is_priceless() {
            "opt-in"
        } else if reward.is_auto_apply() {
            "auto"
        } else {
            "manual"
        };
        let scope = reward
            .geo_city
            .as_deref()
            .or(reward.geo_country.as_deref())
            .unwrap_or(reward.geo_scope.as_str());

        println!(
            "   {:>3} │ {:<28} │ {:<14} │ {:<6} │ {}",
            reward.id,
            truncate(&reward.label, 28),
            reward.category.as_deref().unwrap_or("-"),
            how,
            scope
        );
    }

    Ok(())
}
