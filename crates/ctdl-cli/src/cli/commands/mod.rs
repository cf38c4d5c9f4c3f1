//! CLI command handlers, one file per command.

mod download;
mod extract;
mod ledger;
mod plan;

pub use download::run_download;
pub use extract::run_extract;
pub use ledger::run_ledger;
pub use plan::run_plan;
