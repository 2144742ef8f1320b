//! Web server command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use effortless_core::{AppConfig, Repository};
use effortless_server::{AppState, ServerConfig};

use super::{build_assembler, open_store};

pub async fn cmd_serve(
    config: &AppConfig,
    data_dir: &Path,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Effortless web server...");
    println!("   Data: {}", data_dir.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if !config.server.allowed_origins.is_empty() {
        println!("   CORS origins: {}", config.server.allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let repo: Arc<dyn Repository> = Arc::new(open_store(data_dir)?);
    let assembler = build_assembler(config, None)?;
    let server_config = ServerConfig {
        allowed_origins: config.server.allowed_origins.clone(),
    };

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    effortless_server::serve(
        AppState::new(repo, assembler, server_config),
        host,
        port,
        static_dir_str,
    )
    .await?;

    Ok(())
}
