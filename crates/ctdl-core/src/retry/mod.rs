//! Retry and backoff policy for source fetches.
//!
//! This module encapsulates error classification (throttling, connection
//! failures, empty responses) and exponential backoff decisions so that the
//! fetch client and the orchestrator share one consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::{FetchError, TerminalFetchError};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
