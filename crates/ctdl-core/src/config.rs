use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::ledger::DEFAULT_LEDGER_FILE;
use crate::retry::RetryPolicy;

/// Default endpoint of the Etherscan-compatible source API.
pub const DEFAULT_API_URL: &str = "https://api.etherscan.io/api";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per key (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay_secs: 1.0,
            max_delay_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/ctdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CtdlConfig {
    /// Source API endpoint (`module=contract&action=getsourcecode` is appended).
    pub api_url: String,
    /// API key used when `--token` is not given.
    pub api_key: Option<String>,
    /// Failure ledger shared by all shards, relative to the working directory.
    pub ledger_path: PathBuf,
    /// Unpack fetched bundles into individual source files under `<output>/contracts`.
    pub extract_sources: bool,
    /// Connect timeout for one request, in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for CtdlConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            ledger_path: PathBuf::from(DEFAULT_LEDGER_FILE),
            extract_sources: true,
            connect_timeout_secs: 15,
            request_timeout_secs: 60,
            retry: None,
        }
    }
}

impl CtdlConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ctdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CtdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CtdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: CtdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
