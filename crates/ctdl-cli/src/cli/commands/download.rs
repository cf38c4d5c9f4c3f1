//! `ctdl download` – fetch one shard of an address list.

use anyhow::{Context, Result};
use ctdl_core::artifact::FileArtifactWriter;
use ctdl_core::config::CtdlConfig;
use ctdl_core::etherscan::EtherscanClient;
use ctdl_core::fetch::RetryingFetcher;
use ctdl_core::keys::KeySource;
use ctdl_core::ledger::FailureLedger;
use ctdl_core::orchestrator::Orchestrator;
use ctdl_core::progress::{ConsoleProgress, NoProgress, ProgressSink};
use ctdl_core::shard::ShardPlan;

use crate::cli::DownloadArgs;

pub fn run_download(cfg: &CtdlConfig, args: &DownloadArgs) -> Result<()> {
    // Everything that can reject the input runs before the first request.
    let shard_index = args.shard_index()?;
    let keys = KeySource::new(&args.addresses);
    let total = keys
        .count()
        .with_context(|| format!("scan address list {}", args.addresses.display()))?;
    let plan = ShardPlan::plan(total, args.shard, shard_index, args.skip)?;

    let ledger_path = args.ledger.clone().unwrap_or_else(|| cfg.ledger_path.clone());
    let mut ledger = FailureLedger::load(&ledger_path)?;

    let client = EtherscanClient::from_config(cfg, args.token.clone());
    if !client.has_api_key() {
        tracing::warn!("no API key configured; requests will be heavily rate limited");
    }
    let fetcher = RetryingFetcher::new(client, cfg.retry_policy());
    let writer = FileArtifactWriter::new(&args.output, cfg.extract_sources && !args.no_extract)?;
    let progress: Box<dyn ProgressSink> = if args.no_progress {
        Box::new(NoProgress)
    } else {
        Box::new(ConsoleProgress::new(&plan))
    };

    tracing::info!(
        addresses = %args.addresses.display(),
        output = %args.output.display(),
        ledger = %ledger_path.display(),
        "{} covers records {}..{} of {}",
        plan.label(),
        plan.start_line,
        plan.end_line,
        plan.total_keys
    );

    let mut orchestrator = Orchestrator::new(fetcher, writer, progress);
    let summary = orchestrator.run(&keys, &plan, &mut ledger)?;

    println!(
        "{}: {} processed, {} written ({} empty), {} failed, {} skipped",
        plan.label(),
        summary.processed,
        summary.written,
        summary.empty,
        summary.failed,
        summary.skipped
    );
    Ok(())
}
