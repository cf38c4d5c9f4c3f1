//! Failure ledger: keys whose fetch failed terminally and must not be retried.
//!
//! The ledger is one JSON array of keys, shared by every shard process and
//! every run that points at the same file. Recording a failure persists the
//! whole set before returning. Writes go through a temp file and a rename, so
//! readers only ever see a complete old or new file.
//!
//! Shards do not lock the file. Before each write the on-disk set is merged
//! into memory, which narrows the window in which two shards can overwrite
//! each other's additions but does not close it; a lost entry only means that
//! key is fetched once more on a later run.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default ledger file name, relative to the working directory.
pub const DEFAULT_LEDGER_FILE: &str = "not_valid.json";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failure ledger {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failure ledger {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct FailureLedger {
    path: PathBuf,
    keys: BTreeSet<String>,
    /// Failures recorded through this handle.
    recorded: usize,
}

impl FailureLedger {
    /// Load the ledger at `path`. A missing file is an empty ledger; a file
    /// that is not a JSON array of strings is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let keys = read_keys(&path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), keys = keys.len(), "loaded failure ledger");
        Ok(Self {
            path,
            keys,
            recorded: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of failures recorded through this handle since it was loaded.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Add `key` and persist the full set before returning.
    pub fn record_failure(&mut self, key: &str) -> Result<(), LedgerError> {
        self.keys.insert(key.to_string());
        self.recorded += 1;
        self.persist()
    }

    /// Re-merge with the file and rewrite it if this handle recorded anything.
    pub fn flush(&mut self) -> Result<(), LedgerError> {
        if self.recorded == 0 {
            return Ok(());
        }
        self.persist()
    }

    fn persist(&mut self) -> Result<(), LedgerError> {
        if let Some(on_disk) = read_keys(&self.path)? {
            self.keys.extend(on_disk);
        }
        write_keys(&self.path, &self.keys)
    }
}

fn read_keys(path: &Path) -> Result<Option<BTreeSet<String>>, LedgerError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LedgerError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    let keys: Vec<String> = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(keys.into_iter().collect()))
}

fn write_keys(path: &Path, keys: &BTreeSet<String>) -> Result<(), LedgerError> {
    let io_err = |source: io::Error| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };
    let temp_path = temp_path_for(path);
    let json = serde_json::to_vec(keys).map_err(|e| io_err(io::Error::from(e)))?;

    let mut file = File::create(&temp_path).map_err(io_err)?;
    file.write_all(&json).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_err(e));
    }
    Ok(())
}

/// Sibling temp file, unique per process so concurrent shards never share one.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LEDGER_FILE.to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::load(dir.path().join(DEFAULT_LEDGER_FILE)).unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("0xabc"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LEDGER_FILE);
        fs::write(&path, b"[\"0xabc\", ").unwrap();
        assert!(matches!(
            FailureLedger::load(&path),
            Err(LedgerError::Corrupt { .. })
        ));

        fs::write(&path, b"{\"0xabc\": true}").unwrap();
        assert!(matches!(
            FailureLedger::load(&path),
            Err(LedgerError::Corrupt { .. })
        ));
    }

    #[test]
    fn record_failure_is_written_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LEDGER_FILE);
        let mut ledger = FailureLedger::load(&path).unwrap();
        ledger.record_failure("0xdead").unwrap();

        // Visible to a fresh reader without any flush.
        let reloaded = FailureLedger::load(&path).unwrap();
        assert!(reloaded.contains("0xdead"));
        assert_eq!(reloaded.len(), 1);

        let raw: Vec<String> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw, vec!["0xdead".to_string()]);
    }

    #[test]
    fn membership_survives_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LEDGER_FILE);
        FailureLedger::load(&path)
            .unwrap()
            .record_failure("0x01")
            .unwrap();
        let mut second = FailureLedger::load(&path).unwrap();
        second.record_failure("0x02").unwrap();
        let third = FailureLedger::load(&path).unwrap();
        assert!(third.contains("0x01"));
        assert!(third.contains("0x02"));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LEDGER_FILE);
        let mut ledger = FailureLedger::load(&path).unwrap();
        ledger.record_failure("0xa").unwrap();
        ledger.record_failure("0xb").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![DEFAULT_LEDGER_FILE.to_string()]);
    }

    #[test]
    fn concurrent_handles_merge_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LEDGER_FILE);
        // Two shards load the same (empty) state, then each records a failure.
        let mut shard_a = FailureLedger::load(&path).unwrap();
        let mut shard_b = FailureLedger::load(&path).unwrap();
        shard_a.record_failure("0xaaa").unwrap();
        shard_b.record_failure("0xbbb").unwrap();

        let merged = FailureLedger::load(&path).unwrap();
        assert!(merged.contains("0xaaa"));
        assert!(merged.contains("0xbbb"));
    }

    #[test]
    fn flush_without_failures_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LEDGER_FILE);
        let mut ledger = FailureLedger::load(&path).unwrap();
        ledger.flush().unwrap();
        assert!(!path.exists());
    }
}
