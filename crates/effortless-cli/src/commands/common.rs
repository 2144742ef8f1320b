//! Shared utilities for commands
//!
//! - `load_config` - Resolve the configuration file
//! - `open_store` - Load the CSV tables into a repository
//! - `build_assembler` - Insight assembler with the environment's backend

use std::path::Path;

use anyhow::{Context, Result};
use effortless_core::ai::{AIBackend, AIClient};
use effortless_core::{AppConfig, InsightAssembler, MemoryStore};

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path).context("Failed to load configuration")
}

/// Load the data directory; missing files give empty tables
pub fn open_store(data_dir: &Path) -> Result<MemoryStore> {
    MemoryStore::load(data_dir)
        .with_context(|| format!("Failed to load data from {}", data_dir.display()))
}

/// Assembler using the backend selected by the environment, if any
pub fn build_assembler(config: &AppConfig, model: Option<&str>) -> Result<InsightAssembler> {
    let ai = AIClient::from_env().map(|client| match model {
        Some(model) => client.with_model(model),
        None => client,
    });

    if let Some(client) = &ai {
        tracing::debug!(host = client.host(), model = client.model(), "Using AI backend");
    }

    InsightAssembler::new(config.insights.clone(), ai).context("Failed to load insight prompt")
}
