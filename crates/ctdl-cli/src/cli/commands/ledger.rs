//! `ctdl ledger` – inspect the failure ledger.

use anyhow::Result;
use ctdl_core::ledger::FailureLedger;
use std::path::Path;

pub fn run_ledger(path: &Path, check: Option<&str>) -> Result<()> {
    let ledger = FailureLedger::load(path)?;
    match check {
        Some(key) if ledger.contains(key) => println!("{}: recorded as failed", key),
        Some(key) => println!("{}: not recorded", key),
        None => println!("{}: {} failed address(es)", path.display(), ledger.len()),
    }
    Ok(())
}
