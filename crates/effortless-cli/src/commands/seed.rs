//! Demo data command

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use effortless_core::seed;
use effortless_core::store::flatfile::{self, USERS_FILE};

pub fn cmd_seed(out: &Path, seed_value: u64, force: bool) -> Result<()> {
    if out.join(USERS_FILE).exists() && !force {
        bail!(
            "{} already contains data; use --force to overwrite",
            out.display()
        );
    }

    println!("🌱 Generating demo data (seed {})...", seed_value);

    let tables = seed::generate(seed_value, Utc::now()).context("Failed to generate demo data")?;
    flatfile::write_dir(out, &tables)
        .with_context(|| format!("Failed to write data to {}", out.display()))?;

    let applied = tables.transactions.iter().filter(|t| t.reward_applied).count();

    println!("   Users:        {}", tables.users.len());
    println!("   Rewards:      {}", tables.rewards.len());
    println!("   Transactions: {} ({} with rewards applied)", tables.transactions.len(), applied);
    println!("✅ Wrote CSV files to {}", out.display());
    println!();
    println!("Next steps:");
    println!("  1. View a dashboard: effortless dashboard --user 1001");
    println!("  2. Start the API: effortless serve");

    Ok(())
}
