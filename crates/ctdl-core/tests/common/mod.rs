#![allow(dead_code)]

pub mod api_server;

use ctdl_core::progress::{ProgressMeta, ProgressSink};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Progress sink that only counts.
#[derive(Debug, Default)]
pub struct CountingProgress {
    pub updates: u64,
    pub last_meta: ProgressMeta,
}

impl ProgressSink for CountingProgress {
    fn update(&mut self, delta: u64) {
        self.updates += delta;
    }

    fn set_meta(&mut self, meta: &ProgressMeta) {
        self.last_meta = meta.clone();
    }
}

/// Writes `keys` one per line to `<dir>/addresses.csv`.
pub fn write_key_list(dir: &Path, keys: &[String]) -> PathBuf {
    let path = dir.join("addresses.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    for k in keys {
        writeln!(f, "{},", k).unwrap();
    }
    path
}

/// `0x0001`, `0x0002`, ...
pub fn numbered_keys(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("0x{:04}", i)).collect()
}

pub fn ok_body(source: &str, name: &str) -> String {
    serde_json::json!({
        "status": "1",
        "message": "OK",
        "result": [{ "SourceCode": source, "ContractName": name, "ABI": "[]" }]
    })
    .to_string()
}

pub fn notok_body(result: &str) -> String {
    serde_json::json!({ "status": "0", "message": "NOTOK", "result": result }).to_string()
}
