//! `ctdl plan` – show how an address list splits into shards.

use anyhow::{Context, Result};
use ctdl_core::keys::KeySource;
use ctdl_core::shard;
use std::path::Path;

pub fn run_plan(addresses: &Path, shard_count: u32, skip: u64) -> Result<()> {
    let total = KeySource::new(addresses)
        .count()
        .with_context(|| format!("scan address list {}", addresses.display()))?;
    let plans = shard::plan_all(total, shard_count, skip)?;

    println!("{} address(es), {} shard(s), skip {}", total, shard_count, skip);
    println!("{:<8} {:<12} {:<12} {}", "INDEX", "START", "END", "KEYS");
    for p in plans {
        println!(
            "{:<8} {:<12} {:<12} {}",
            p.shard_index,
            p.start_line,
            p.end_line,
            p.len()
        );
    }
    Ok(())
}
