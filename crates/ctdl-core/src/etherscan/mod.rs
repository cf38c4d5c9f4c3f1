//! Etherscan-compatible `getsourcecode` client.
//!
//! Uses the curl crate (libcurl) for one blocking GET per key and maps every
//! failure onto [`FetchError`] so the retry policy can classify it.

mod parse;

pub use parse::{parse_result_payload, parse_source_response};

use std::str;
use std::time::Duration;

use crate::config::CtdlConfig;
use crate::fetch::{ArtifactBundle, ArtifactFetcher};
use crate::retry::FetchError;

/// Blocking client for one source API endpoint.
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    api_url: String,
    api_key: Option<String>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl EtherscanClient {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }

    /// Client from config; `token` (the CLI flag) takes precedence over `api_key`.
    pub fn from_config(cfg: &CtdlConfig, token: Option<String>) -> Self {
        Self::new(cfg.api_url.clone(), token.or_else(|| cfg.api_key.clone()))
            .with_timeouts(cfg.connect_timeout(), cfg.request_timeout())
    }

    pub fn with_timeouts(mut self, connect: Duration, total: Duration) -> Self {
        self.connect_timeout = connect;
        self.timeout = total;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full request URL for `address`.
    pub fn request_url(&self, address: &str) -> Result<String, FetchError> {
        let mut params = vec![
            ("module", "contract"),
            ("action", "getsourcecode"),
            ("address", address),
        ];
        if let Some(key) = self.api_key.as_deref() {
            params.push(("apikey", key));
        }
        let url = url::Url::parse_with_params(&self.api_url, &params)
            .map_err(|e| FetchError::Transport(format!("invalid API URL {}: {}", self.api_url, e)))?;
        Ok(url.into())
    }
}

impl ArtifactFetcher for EtherscanClient {
    fn fetch(&self, key: &str) -> Result<ArtifactBundle, FetchError> {
        let url = self.request_url(key)?;
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.accept_encoding("")?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            tracing::debug!(key, code, "source API returned non-success status");
            return Err(FetchError::from_http_status(code));
        }

        parse::parse_source_response(&body)
    }
}
