//! Retry loop: run a fetch attempt until success or the policy says stop.

use super::classify;
use super::error::{FetchError, TerminalFetchError};
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// `f` receives the 1-based attempt number. On a retryable failure the
/// calling thread sleeps for the backoff delay, then tries again. One debug
/// event is emitted per attempt.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, key: &str, mut f: F) -> Result<T, TerminalFetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        tracing::debug!(key, attempt, "fetch attempt");
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return Err(TerminalFetchError {
                            key: key.to_string(),
                            attempts: attempt,
                            cause: e,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(key, attempt, ?kind, delay_ms = d.as_millis() as u64, error = %e, "retrying fetch");
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
