//! Insight generation command

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use effortless_core::ai::AIBackend;
use effortless_core::dashboard;
use effortless_core::{AppConfig, InsightMode, Reward};

use super::{build_assembler, open_store};

pub async fn cmd_insights(
    config: &AppConfig,
    data_dir: &Path,
    user_id: i64,
    model: Option<&str>,
    json: bool,
) -> Result<()> {
    let store = open_store(data_dir)?;
    let assembler = build_assembler(config, model)?;

    if !json {
        match assembler.ai() {
            Some(ai) => println!("🤖 Generating insights with {} ({})...", ai.model(), ai.host()),
            None => println!("💡 Tip: Set OLLAMA_HOST for generated insights"),
        }
    }

    let bundle = dashboard::insight_bundle(&store, &assembler, user_id, Utc::now()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    println!();
    println!("✨ Insights ({})", bundle.mode.as_str());
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {}", bundle.summary_text);
    println!();
    for insight in &bundle.top_insights {
        println!("   • {}", insight);
    }
    if bundle.mode == InsightMode::Fallback && assembler.ai().is_some() {
        println!();
        println!("   ⚠️  Backend unavailable; showing templated insights");
    }

    print_rewards("⚡ Recommended Auto-Apply Rewards", &bundle.recommended_auto_apply_rewards);
    print_rewards(
        "🌟 Recommended Priceless Experiences",
        &bundle.recommended_priceless_experiences,
    );

    if !bundle.notify_experience_ids.is_empty() {
        println!();
        println!(
            "   🔔 Would notify about {} experience(s)",
            bundle.notify_experience_ids.len()
        );
    }

    println!();
    Ok(())
}

fn print_rewards(title: &str, rewards: &[Reward]) {
    if rewards.is_empty() {
        return;
    }
    println!();
    println!("   {}", title);
    for reward in rewards {
        println!("     {:>3} │ {} ({})", reward.id, reward.label, reward.merchant_name);
    }
}
