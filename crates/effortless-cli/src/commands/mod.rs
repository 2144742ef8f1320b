//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `common` - Shared utilities (config, store, assembler)
//! - `insights` - Insight generation command
//! - `rewards` - Reward catalog command
//! - `seed` - Demo data generation command
//! - `serve` - Web server command
//! - `status` - Users and dashboard commands
//! - `transactions` - Transaction listing command

pub mod common;
pub mod insights;
pub mod rewards;
pub mod seed;
pub mod serve;
pub mod status;
pub mod transactions;

// Re-export command functions for main.rs
pub use common::*;
pub use insights::*;
pub use rewards::*;
pub use seed::*;
pub use serve::*;
pub use status::*;
pub use transactions::*;

use effortless_core::insights::format_money;
use rust_decimal::Decimal;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Signed amount, red for spend and green for income
pub fn colored_amount(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("\x1b[31m${}\x1b[0m", format_money(amount.abs())) // Red for expenses
    } else {
        format!("\x1b[32m+${}\x1b[0m", format_money(amount)) // Green for income
    }
}
