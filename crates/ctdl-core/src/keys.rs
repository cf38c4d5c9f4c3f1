//! Address list reader.
//!
//! The list is a header-less delimited file; the key is the first column of
//! each record. Reading is lazy and forward-only; restart by calling
//! [`KeySource::open`] again.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeySourceError {
    #[error("address list not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("malformed record {line} in address list: {reason}")]
    MalformedInput { line: u64, reason: String },
    #[error("read address list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle on an address list file.
#[derive(Debug, Clone)]
pub struct KeySource {
    path: PathBuf,
}

impl KeySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh sequence positioned before the first record.
    pub fn open(&self) -> Result<KeySequence, KeySourceError> {
        let file = File::open(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                KeySourceError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                KeySourceError::Io {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        Ok(KeySequence {
            path: self.path.clone(),
            records: reader.into_records(),
            line: 0,
        })
    }

    /// Total number of keys. Scans (and validates) the whole file.
    pub fn count(&self) -> Result<u64, KeySourceError> {
        let mut n = 0u64;
        for item in self.open()? {
            item?;
            n += 1;
        }
        Ok(n)
    }
}

/// Lazy sequence of `(line, key)` pairs in file order. `line` is the 1-based
/// record position.
pub struct KeySequence {
    path: PathBuf,
    records: csv::StringRecordsIntoIter<File>,
    line: u64,
}

impl Iterator for KeySequence {
    type Item = Result<(u64, String), KeySourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.line += 1;
        let line = self.line;
        Some(match record {
            Ok(record) => match record.get(0).map(str::trim) {
                Some(key) if !key.is_empty() => Ok((line, key.to_string())),
                _ => Err(KeySourceError::MalformedInput {
                    line,
                    reason: "empty first column".to_string(),
                }),
            },
            Err(e) => Err(self.decode_error(line, e)),
        })
    }
}

impl KeySequence {
    fn decode_error(&self, line: u64, e: csv::Error) -> KeySourceError {
        let reason = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(source) => KeySourceError::Io {
                path: self.path.clone(),
                source,
            },
            _ => KeySourceError::MalformedInput { line, reason },
        }
    }
}
