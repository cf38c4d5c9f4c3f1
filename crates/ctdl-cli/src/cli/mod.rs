//! CLI for the ctdl contract source downloader.

mod commands;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use ctdl_core::config;
use std::path::PathBuf;

use commands::{run_download, run_extract, run_ledger, run_plan};

const DEFAULT_ADDRESSES: &str = "contract_addresses.csv";

/// Top-level CLI for ctdl.
#[derive(Debug, Parser)]
#[command(name = "ctdl")]
#[command(about = "ctdl: sharded, resumable contract source downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download contract sources for one shard of an address list.
    Download(DownloadArgs),

    /// Print the line range of every shard of an address list.
    Plan {
        /// CSV file with one contract address per line (first column).
        #[arg(short, long, default_value = DEFAULT_ADDRESSES)]
        addresses: PathBuf,
        /// Number of shards to split the list into.
        #[arg(long, default_value = "1", value_name = "N")]
        shard: u32,
        /// Lines to skip at the start of the list.
        #[arg(long, default_value = "0", value_name = "LINES")]
        skip: u64,
    },

    /// Re-extract source files from a stored `<address>.json` artifact.
    Extract {
        /// Path to the artifact file.
        path: PathBuf,
        /// Output directory (sources go to `<output>/contracts`). Defaults to the artifact's directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the failure ledger size, or whether one address is recorded.
    Ledger {
        /// Ledger file (default: `ledger_path` from config.toml).
        #[arg(long)]
        ledger: Option<PathBuf>,
        /// Address to look up.
        #[arg(long, value_name = "ADDRESS")]
        check: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Source API key (overrides `api_key` in config.toml).
    #[arg(short, long)]
    pub token: Option<String>,

    /// CSV file with one contract address per line (first column).
    #[arg(short, long, default_value = DEFAULT_ADDRESSES)]
    pub addresses: PathBuf,

    /// Directory for `<address>.json` artifacts.
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Number of shards the address list is split into.
    #[arg(long, default_value = "1", value_name = "N")]
    pub shard: u32,

    /// Zero-based shard to process. Required when --shard is greater than 1.
    #[arg(long, value_name = "I")]
    pub index: Option<u32>,

    /// Lines to skip at the start of the address list.
    #[arg(long, default_value = "0", value_name = "LINES")]
    pub skip: u64,

    /// Failure ledger file (default: `ledger_path` from config.toml).
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Do not unpack sources into `<output>/contracts`.
    #[arg(long)]
    pub no_extract: bool,

    /// Do not draw a progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

impl DownloadArgs {
    /// Shard index to run; an explicit index is required once the list is split.
    pub fn shard_index(&self) -> Result<u32> {
        match self.index {
            Some(index) => Ok(index),
            None if self.shard > 1 => {
                bail!("--index is required when --shard is greater than 1")
            }
            None => Ok(0),
        }
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!(
            api_url = %cfg.api_url,
            ledger = %cfg.ledger_path.display(),
            "loaded config"
        );

        match cli.command {
            CliCommand::Download(args) => run_download(&cfg, &args)?,
            CliCommand::Plan {
                addresses,
                shard,
                skip,
            } => run_plan(&addresses, shard, skip)?,
            CliCommand::Extract { path, output } => run_extract(&path, output.as_deref())?,
            CliCommand::Ledger { ledger, check } => {
                let path = ledger.unwrap_or_else(|| cfg.ledger_path.clone());
                run_ledger(&path, check.as_deref())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
