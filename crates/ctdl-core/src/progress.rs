//! Live shard progress.
//!
//! The orchestrator reports one update per key plus the running counters in
//! [`ProgressMeta`]; nothing here is persisted.

use indicatif::{ProgressBar, ProgressStyle};

use crate::shard::ShardPlan;

const BAR_TEMPLATE: &str = "{prefix} {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}] {msg}";

/// Counters for the current run; reset every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressMeta {
    pub shard_label: String,
    /// Keys fetched successfully but with no published source.
    pub empty: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl ProgressMeta {
    pub fn new(shard_label: impl Into<String>) -> Self {
        Self {
            shard_label: shard_label.into(),
            ..Self::default()
        }
    }

    /// `empty=.. failed=.. skipped=..`
    pub fn render(&self) -> String {
        format!(
            "empty={} failed={} skipped={}",
            self.empty, self.failed, self.skipped
        )
    }
}

pub trait ProgressSink {
    /// Advance the completed count.
    fn update(&mut self, delta: u64);
    /// Replace the displayed counters.
    fn set_meta(&mut self, meta: &ProgressMeta);
    /// Print a one-off line (e.g. a key failure) without breaking the display.
    fn note(&mut self, _message: &str) {}
    /// Leave the final state on screen.
    fn finish(&mut self) {}
}

/// Terminal progress bar on stderr, one per shard process.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(plan: &ShardPlan) -> Self {
        let bar = ProgressBar::new(plan.len());
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|s| s.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_prefix(plan.label());
        Self { bar }
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&mut self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_meta(&mut self, meta: &ProgressMeta) {
        self.bar.set_message(meta.render());
    }

    fn note(&mut self, message: &str) {
        self.bar.println(message);
    }

    fn finish(&mut self) {
        self.bar.finish();
    }
}

/// Discards all updates (`--no-progress`, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _delta: u64) {}

    fn set_meta(&mut self, _meta: &ProgressMeta) {}
}

impl<P: ProgressSink + ?Sized> ProgressSink for Box<P> {
    fn update(&mut self, delta: u64) {
        (**self).update(delta)
    }

    fn set_meta(&mut self, meta: &ProgressMeta) {
        (**self).set_meta(meta)
    }

    fn note(&mut self, message: &str) {
        (**self).note(message)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}
