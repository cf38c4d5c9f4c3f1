//! Unpack a fetched source bundle into individual source files.
//!
//! Multi-file contracts come back as Solidity standard-JSON input wrapped in
//! an extra pair of braces (`{{ ... }}`); older multi-file entries are a plain
//! `{"File.sol": {"content": ...}}` map; single-file contracts are raw source
//! text.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::artifact::sanitize_file_component;
use crate::fetch::ArtifactBundle;

/// Sub-directory of the output directory that receives extracted sources.
pub const CONTRACTS_DIR: &str = "contracts";

#[derive(Debug, Deserialize)]
struct SourceEntry {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StandardJsonInput {
    sources: BTreeMap<String, SourceEntry>,
}

/// Strips one outer brace pair from a `{{ ... }}` envelope.
pub fn unwrap_double_braces(source: &str) -> Option<&str> {
    let trimmed = source.trim();
    if trimmed.len() >= 4 && trimmed.starts_with("{{") && trimmed.ends_with("}}") {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}

/// Writes the sources in `bundle` under `contracts_dir`; returns the number of files written.
pub fn extract_sources(key: &str, bundle: &ArtifactBundle, contracts_dir: &Path) -> Result<usize> {
    let content = bundle.content.trim();
    if content.is_empty() {
        return Ok(0);
    }

    let json = unwrap_double_braces(content).or_else(|| content.starts_with('{').then_some(content));
    let Some(json) = json else {
        let name = bundle.contract_name.as_deref().unwrap_or(key);
        let path = contracts_dir
            .join(sanitize_file_component(key))
            .join(format!("{}.sol", sanitize_file_component(name)));
        write_source(&path, content)?;
        return Ok(1);
    };

    let sources = match serde_json::from_str::<StandardJsonInput>(json) {
        Ok(input) => input.sources,
        Err(_) => serde_json::from_str::<BTreeMap<String, SourceEntry>>(json)
            .context("source bundle is neither standard JSON input nor a source map")?,
    };

    let mut written = 0usize;
    for (rel, entry) in &sources {
        let path = safe_join(contracts_dir, rel)?;
        write_source(&path, &entry.content)?;
        written += 1;
    }
    Ok(written)
}

fn write_source(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("write source: {}", path.display()))
}

/// Joins a bundle-relative source path onto `base`, refusing anything that
/// could escape it.
fn safe_join(base: &Path, rel: &str) -> Result<PathBuf> {
    let mut out = base.to_path_buf();
    let mut depth = 0usize;
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("unsafe source path in bundle: {}", rel)
            }
        }
    }
    if depth == 0 {
        bail!("empty source path in bundle");
    }
    Ok(out)
}
