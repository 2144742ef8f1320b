//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Effortless - Card rewards dashboard
#[derive(Parser)]
#[command(name = "effortless")]
#[command(about = "Rewards dashboard backend over flat CSV files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding users.csv, preferences.csv, transactions.csv and rewards.csv
    /// (defaults to [data] dir from the config, "data" out of the box)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to the user override, then the built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (defaults to [server] port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to [server] host)
        #[arg(long)]
        host: Option<String>,

        /// Directory of static files for the dashboard UI
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Generate demo data into the data directory
    Seed {
        /// Random seed; the same seed gives the same data
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory (defaults to the data directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Overwrite existing CSV files
        #[arg(long)]
        force: bool,
    },

    /// List users
    Users,

    /// Show a user's dashboard summary
    Dashboard {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Only count the last N days of savings and spending
        #[arg(long)]
        days: Option<u32>,

        /// Entries in each recent-rewards list
        #[arg(long, default_value = "5")]
        recent: usize,
    },

    /// Generate insights and reward recommendations for a user
    Insights {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Override the backend model
        #[arg(short, long)]
        model: Option<String>,

        /// Print the raw bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the reward catalog
    Rewards {
        /// Include rewards outside their active window
        #[arg(long)]
        all: bool,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List a user's transactions, newest first
    Transactions {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}
