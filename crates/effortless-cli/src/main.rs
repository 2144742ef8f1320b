//! Effortless CLI - Card rewards dashboard
//!
//! Usage:
//!   effortless seed                      Generate demo CSV data
//!   effortless dashboard --user 1001     Show a dashboard summary
//!   effortless insights --user 1001      Generate insights and recommendations
//!   effortless serve --port 3000         Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.dir.clone());

    match cli.command {
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            commands::cmd_serve(&config, &data_dir, &host, port, static_dir.as_deref()).await
        }
        Commands::Seed { seed, out, force } => {
            commands::cmd_seed(out.as_deref().unwrap_or(&data_dir), seed, force)
        }
        Commands::Users => commands::cmd_users(&data_dir),
        Commands::Dashboard { user, days, recent } => {
            commands::cmd_dashboard(&data_dir, user, days, recent)
        }
        Commands::Insights { user, model, json } => {
            commands::cmd_insights(&config, &data_dir, user, model.as_deref(), json).await
        }
        Commands::Rewards { all, category } => {
            commands::cmd_rewards(&data_dir, all, category.as_deref())
        }
        Commands::Transactions { user, limit } => {
            commands::cmd_transactions(&data_dir, user, limit)
        }
    }
}
