//! User listing and dashboard commands

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use effortless_core::dashboard::{self, window_start};
use effortless_core::insights::format_money;
use effortless_core::{AggregateOptions, Repository};

use super::{open_store, truncate};

pub fn cmd_users(data_dir: &Path) -> Result<()> {
    let store = open_store(data_dir)?;
    let users = store.list_users()?;

    if users.is_empty() {
        println!("No users found. Generate demo data with:");
        println!("  effortless seed");
        return Ok(());
    }

    println!();
    println!("👤 Users");
    println!("   ─────────────────────────────────────────────────────────────");
    for user in users {
        println!(
            "   {:>6} │ {:<24} │ {}",
            user.id,
            truncate(&user.name, 24),
            user.home_location.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub fn cmd_dashboard(data_dir: &Path, user_id: i64, days: Option<u32>, recent: usize) -> Result<()> {
    let store = open_store(data_dir)?;
    let user = store.require_user(user_id)?;
    let options = AggregateOptions::default()
        .recent_limit(recent)
        .since(window_start(Utc::now(), days.filter(|d| *d > 0)));
    let summary = dashboard::dashboard_summary(&store, user_id, &options)?;

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│        💳 Effortless Dashboard          │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {} ({})", user.name, user.id);
    if let Some(days) = days {
        println!("  Last {} days", days);
    }
    println!();
    println!("  Balance:         ${}", format_money(summary.total_balance));
    println!("  Transactions:    {}", summary.total_transactions);
    println!();
    println!("  💰 Total Saved:  ${}", format_money(summary.total_savings()));
    println!("     Auto-applied:     ${}", format_money(summary.saved_via_auto_apply));
    println!("     Notifications:    ${}", format_money(summary.saved_via_notifications));

    if !summary.rewards_by_category.is_empty() {
        println!();
        println!("  🏷️  Savings by Category");
        for cat in &summary.rewards_by_category {
            println!(
                "     {:<16} ${:>9} ({} rewards)",
                cat.category,
                format_money(cat.total_savings),
                cat.count
            );
        }
    }

    if !summary.spending_by_category.is_empty() {
        println!();
        println!("  🛒 Spending by Category");
        for cat in &summary.spending_by_category {
            println!(
                "     {:<16} ${:>9} ({} purchases)",
                cat.category,
                format_money(cat.total_spent),
                cat.count
            );
        }
    }

    if !summary.recent_rewards_applied.is_empty() {
        println!();
        println!("  ✅ Recent Rewards Applied");
        for activity in &summary.recent_rewards_applied {
            println!(
                "     {} │ +${:>7} │ {} ({})",
                activity.transaction_at.format("%Y-%m-%d"),
                format_money(activity.savings_amount),
                truncate(&activity.description, 28),
                activity.channel.as_str()
            );
        }
    }

    if !summary.recent_rewards_missed.is_empty() {
        println!();
        println!("  ⚠️  Recent Rewards Missed");
        for missed in &summary.recent_rewards_missed {
            println!(
                "     {} │ {} │ {}",
                missed.transaction_at.format("%Y-%m-%d"),
                truncate(&missed.description, 28),
                missed.reason.as_str()
            );
        }
    }

    println!();
    Ok(())
}
