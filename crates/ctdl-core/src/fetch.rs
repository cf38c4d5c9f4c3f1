//! Fetch seam: one blocking call per key, plus the retrying wrapper the
//! orchestrator drives.

use crate::retry::{self, FetchError, RetryPolicy, TerminalFetchError};

/// Result of one successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    /// Source text as published (may be the double-brace JSON envelope).
    pub content: String,
    /// Contract name reported by the API, if any.
    pub contract_name: Option<String>,
    /// The API's result payload, exactly as received.
    pub raw_payload: String,
}

impl ArtifactBundle {
    /// True when the key has no published source (a valid outcome, not an error).
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// One attempt at retrieving the artifact for a key.
pub trait ArtifactFetcher {
    fn fetch(&self, key: &str) -> Result<ArtifactBundle, FetchError>;
}

impl<T: ArtifactFetcher + ?Sized> ArtifactFetcher for &T {
    fn fetch(&self, key: &str) -> Result<ArtifactBundle, FetchError> {
        (**self).fetch(key)
    }
}

impl<T: ArtifactFetcher + ?Sized> ArtifactFetcher for Box<T> {
    fn fetch(&self, key: &str) -> Result<ArtifactBundle, FetchError> {
        (**self).fetch(key)
    }
}

/// Wraps a fetcher with the retry policy; transient errors are retried with
/// backoff, anything else (or an exhausted budget) becomes terminal.
#[derive(Debug, Clone)]
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: ArtifactFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn fetch(&self, key: &str) -> Result<ArtifactBundle, TerminalFetchError> {
        retry::run_with_retry(&self.policy, key, |_| self.inner.fetch(key))
    }
}
