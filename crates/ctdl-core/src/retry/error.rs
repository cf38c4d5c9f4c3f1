//! Fetch error types: per-attempt failures and the terminal error raised once
//! the retry budget is spent.

use thiserror::Error;

use super::classify;
use super::policy::ErrorKind;

/// Error returned by a single fetch attempt against the source API.
/// Classified before any retry decision is made.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API asked us to slow down (HTTP 429/503 or a "rate limit" result).
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// Network-level failure reaching the API (refused, reset, timeout, DNS).
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    /// The API answered with no body or an empty result list.
    #[error("empty response")]
    EmptyResponse,
    /// The API rejected the request (bad key, invalid address, 4xx).
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The body was not the expected JSON envelope.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Any other transport problem (bad URL, TLS setup, ...).
    #[error("transport: {0}")]
    Transport(String),
}

impl FetchError {
    /// Map a non-2xx HTTP status to a fetch error.
    pub fn from_http_status(code: u32) -> Self {
        match classify::classify_http_status(code) {
            ErrorKind::Throttled => FetchError::RateLimited(format!("HTTP {}", code)),
            _ => FetchError::BadRequest(format!("HTTP {}", code)),
        }
    }

    /// True when the error is worth another attempt.
    pub fn is_transient(&self) -> bool {
        classify::classify(self) != ErrorKind::Other
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        match classify::classify_curl_error(&e) {
            ErrorKind::Connection => FetchError::ConnectionRefused(e.to_string()),
            _ => FetchError::Transport(e.to_string()),
        }
    }
}

/// A key whose fetch will not succeed within the configured attempt budget.
#[derive(Debug, Error)]
#[error("fetch {key} failed after {attempts} attempt(s): {cause}")]
pub struct TerminalFetchError {
    pub key: String,
    pub attempts: u32,
    #[source]
    pub cause: FetchError,
}
