//! Shard download loop.
//!
//! Walks the address list in file order, visits only the records inside the
//! shard's range, and drives each key through
//! `Pending -> Fetching -> {Written, Failed, Skipped}`. A terminal fetch
//! failure goes to the ledger and the loop moves on; only input, ledger and
//! output I/O errors end the run early.

use anyhow::{Context, Result};

use crate::artifact::ArtifactSink;
use crate::fetch::{ArtifactFetcher, RetryingFetcher};
use crate::keys::KeySource;
use crate::ledger::FailureLedger;
use crate::progress::{ProgressMeta, ProgressSink};
use crate::shard::ShardPlan;

/// Terminal state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Fetched and handed to the writer; `empty` when no source is published.
    Written { empty: bool },
    /// Retries exhausted or non-transient error; now in the ledger.
    Failed,
    /// Already in the ledger; not fetched.
    Skipped,
}

/// Totals for one shard run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: u64,
    pub written: u64,
    pub empty: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: KeyOutcome) {
        self.processed += 1;
        match outcome {
            KeyOutcome::Written { empty } => {
                self.written += 1;
                if empty {
                    self.empty += 1;
                }
            }
            KeyOutcome::Failed => self.failed += 1,
            KeyOutcome::Skipped => self.skipped += 1,
        }
    }
}

pub struct Orchestrator<F, W, P> {
    fetcher: RetryingFetcher<F>,
    writer: W,
    progress: P,
}

impl<F, W, P> Orchestrator<F, W, P>
where
    F: ArtifactFetcher,
    W: ArtifactSink,
    P: ProgressSink,
{
    pub fn new(fetcher: RetryingFetcher<F>, writer: W, progress: P) -> Self {
        Self {
            fetcher,
            writer,
            progress,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Process every key of `plan` from `keys`, consulting and updating `ledger`.
    pub fn run(
        &mut self,
        keys: &KeySource,
        plan: &ShardPlan,
        ledger: &mut FailureLedger,
    ) -> Result<RunSummary> {
        let span = tracing::info_span!("shard", shard = %plan.label());
        let _guard = span.enter();
        tracing::info!(
            start = plan.start_line,
            end = plan.end_line,
            total = plan.total_keys,
            known_failures = ledger.len(),
            "starting shard"
        );

        let mut meta = ProgressMeta::new(plan.label());
        let mut summary = RunSummary::default();

        for item in keys.open()? {
            let (line, key) = item?;
            if line <= plan.start_line {
                continue;
            }
            if line > plan.end_line {
                break;
            }

            let outcome = self.process_key(&key, ledger)?;
            summary.record(outcome);
            meta.empty = summary.empty;
            meta.failed = summary.failed;
            meta.skipped = summary.skipped;
            self.progress.set_meta(&meta);
            self.progress.update(1);
        }

        self.progress.finish();
        ledger.flush().context("flush failure ledger")?;

        tracing::info!(
            processed = summary.processed,
            written = summary.written,
            empty = summary.empty,
            failed = summary.failed,
            skipped = summary.skipped,
            "shard finished"
        );
        Ok(summary)
    }

    /// Drive a single key to its terminal state.
    pub fn process_key(&mut self, key: &str, ledger: &mut FailureLedger) -> Result<KeyOutcome> {
        if ledger.contains(key) {
            tracing::debug!(key, "skipping key recorded in failure ledger");
            return Ok(KeyOutcome::Skipped);
        }

        match self.fetcher.fetch(key) {
            Ok(bundle) => {
                let empty = bundle.is_empty();
                let path = self
                    .writer
                    .write(key, &bundle)
                    .with_context(|| format!("write artifact for {}", key))?;
                tracing::debug!(key, path = %path.display(), empty, "artifact written");
                Ok(KeyOutcome::Written { empty })
            }
            Err(e) => {
                tracing::warn!(key, attempts = e.attempts, error = %e.cause, "terminal fetch failure");
                self.progress.note(&e.to_string());
                ledger
                    .record_failure(key)
                    .with_context(|| format!("record failure for {}", key))?;
                Ok(KeyOutcome::Failed)
            }
        }
    }
}
