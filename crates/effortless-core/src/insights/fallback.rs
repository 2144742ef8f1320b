//! Deterministic templated insight text
//!
//! Used when no backend is configured or generation fails. Pure formatting
//! over the summary, so it cannot fail.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::aggregate::DashboardSummary;
use crate::ai::GeneratedInsights;

/// Dollar amount with two decimals, no currency sign
pub fn format_money(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Phrase for the summarized period, e.g. "Over the last 30 days"
pub fn period_phrase(window_days: Option<u32>) -> String {
    match window_days {
        Some(1) => "Over the last day".to_string(),
        Some(days) => format!("Over the last {} days", days),
        None => "So far".to_string(),
    }
}

/// Summary paragraph and three insights built from the summary alone
pub fn fallback_insights(summary: &DashboardSummary, window_days: Option<u32>) -> GeneratedInsights {
    let total = summary.total_savings();
    let top_savings = summary
        .rewards_by_category
        .first()
        .map(|c| c.category.as_str())
        .unwrap_or("various categories");

    let mut summary_text = format!(
        "{}, you've saved ${} through Effortless rewards. Most of your savings came from {}.",
        period_phrase(window_days),
        format_money(total),
        top_savings
    );
    if let Some(top) = summary.spending_by_category.first() {
        summary_text.push_str(&format!(
            " Your top spending category is {} at ${}.",
            top.category,
            format_money(top.total_spent)
        ));
    }

    let spending_insight = match summary.spending_by_category.first() {
        Some(top) => format!(
            "Your top spending category is {} with {} purchases",
            top.category, top.count
        ),
        None => "No spending recorded yet for this period".to_string(),
    };

    let savings_insight = format!(
        "You've saved ${} through automatic rewards",
        format_money(summary.saved_via_auto_apply)
    );

    let action_insight = if !summary.recent_rewards_missed.is_empty() {
        format!(
            "You recently missed {} eligible rewards; enabling more auto-apply rewards can capture them",
            summary.recent_rewards_missed.len()
        )
    } else if summary.saved_via_notifications > Decimal::ZERO {
        format!(
            "Priceless notifications added ${} in savings",
            format_money(summary.saved_via_notifications)
        )
    } else {
        "Consider enabling more auto-apply rewards to maximize savings".to_string()
    };

    GeneratedInsights {
        summary_text,
        top_insights: vec![spending_insight, savings_insight, action_insight],
    }
}
