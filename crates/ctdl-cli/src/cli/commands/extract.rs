//! `ctdl extract` – unpack sources from an artifact already on disk.

use anyhow::{Context, Result};
use ctdl_core::etherscan;
use ctdl_core::extract::{self, CONTRACTS_DIR};
use std::path::Path;

pub fn run_extract(path: &Path, output: Option<&Path>) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read artifact: {}", path.display()))?;
    let bundle = etherscan::parse_result_payload(&raw)
        .with_context(|| format!("parse artifact: {}", path.display()))?;
    let key = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .context("artifact path has no file name")?;

    if bundle.is_empty() {
        println!("{}: no published source", key);
        return Ok(());
    }

    let output = output
        .or_else(|| path.parent())
        .unwrap_or_else(|| Path::new("."));
    let contracts_dir = output.join(CONTRACTS_DIR);
    let n = extract::extract_sources(&key, &bundle, &contracts_dir)?;
    println!("{}: {} source file(s) -> {}", key, n, contracts_dir.display());
    Ok(())
}
