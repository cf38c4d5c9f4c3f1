pub mod config;
pub mod logging;

pub mod artifact;
pub mod etherscan;
pub mod extract;
pub mod fetch;
pub mod keys;
pub mod ledger;
pub mod orchestrator;
pub mod progress;
pub mod retry;
pub mod shard;
