//! Application configuration
//!
//! Resolution order:
//! 1. An explicit path (`--config`), which must exist
//! 2. `~/.local/share/effortless/config.toml` when present
//! 3. The embedded `config/effortless.toml`
//!
//! Every key is optional; missing keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default configuration (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/effortless.toml");

/// Data source settings
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub dir: PathBuf,
}

/// Insight assembly settings
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsConfig {
    /// Bounded wait on the generation backend
    pub timeout: Duration,
    /// Recommendations per list
    pub top_k: usize,
    pub recent_limit: usize,
    /// Ranking value of an experience reward
    pub experience_value: Decimal,
    /// Days of activity the insight text covers, `None` for all time
    pub window_days: Option<u32>,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data: DataConfig,
    pub insights: InsightsConfig,
    pub server: ServerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                dir: PathBuf::from("data"),
            },
            insights: InsightsConfig {
                timeout: Duration::from_secs(10),
                top_k: 3,
                recent_limit: 5,
                experience_value: Decimal::new(25, 0),
                window_days: Some(30),
            },
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
                allowed_origins: Vec::new(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration, see the module docs for the resolution order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let content = match explicit {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config {}: {}", path.display(), e))
            })?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Using config override");
                    fs::read_to_string(&path)
                        .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
                }
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }
}

/// Default config override location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("effortless").join("config.toml"))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    data: Option<RawData>,
    insights: Option<RawInsights>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawData {
    dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInsights {
    timeout_secs: Option<u64>,
    top_k: Option<usize>,
    recent_limit: Option<usize>,
    experience_value: Option<u32>,
    window_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<Vec<String>>,
}

fn parse_config(content: &str) -> Result<AppConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AppConfig::default();

    if let Some(data) = raw.data {
        if let Some(dir) = data.dir {
            config.data.dir = dir;
        }
    }

    if let Some(insights) = raw.insights {
        if let Some(secs) = insights.timeout_secs {
            if secs == 0 {
                return Err(Error::Config("insights.timeout_secs must be positive".into()));
            }
            config.insights.timeout = Duration::from_secs(secs);
        }
        if let Some(top_k) = insights.top_k {
            config.insights.top_k = top_k;
        }
        if let Some(limit) = insights.recent_limit {
            config.insights.recent_limit = limit;
        }
        if let Some(value) = insights.experience_value {
            config.insights.experience_value = Decimal::from(value);
        }
        if let Some(days) = insights.window_days {
            config.insights.window_days = (days > 0).then_some(days);
        }
    }

    if let Some(server) = raw.server {
        if let Some(host) = server.host {
            config.server.host = host;
        }
        if let Some(port) = server.port {
            config.server.port = port;
        }
        if let Some(origins) = server.allowed_origins {
            config.server.allowed_origins = origins;
        }
    }

    Ok(config)
}
