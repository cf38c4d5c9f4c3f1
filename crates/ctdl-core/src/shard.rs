//! Shard planning: split an address list into per-process line ranges.

use thiserror::Error;

/// Rejected `(shard_count, shard_index)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShardSpecError {
    #[error("shard count must be at least 1")]
    ZeroShards,
    #[error("shard index {index} out of range for {count} shard(s)")]
    IndexOutOfRange { index: u32, count: u32 },
}

/// Range of the address list assigned to one shard invocation.
///
/// `start_line..end_line` is half-open over 0-based record indexes; in 1-based
/// line terms a record at line `p` belongs to the shard when
/// `start_line < p <= end_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    pub shard_count: u32,
    pub shard_index: u32,
    pub skip: u64,
    pub total_keys: u64,
    /// `floor(total_keys / shard_count)`.
    pub batch_size: u64,
    pub start_line: u64,
    pub end_line: u64,
}

impl ShardPlan {
    /// Plans the range for `shard_index` of `shard_count`.
    ///
    /// Every shard gets `batch_size` records starting after `skip`; the last
    /// shard also absorbs the remainder up to `total_keys`. A skip past the
    /// end of the list yields an empty range.
    pub fn plan(
        total_keys: u64,
        shard_count: u32,
        shard_index: u32,
        skip: u64,
    ) -> Result<Self, ShardSpecError> {
        if shard_count == 0 {
            return Err(ShardSpecError::ZeroShards);
        }
        if shard_index >= shard_count {
            return Err(ShardSpecError::IndexOutOfRange {
                index: shard_index,
                count: shard_count,
            });
        }

        let batch_size = total_keys / u64::from(shard_count);
        let start_line = skip
            .saturating_add(u64::from(shard_index).saturating_mul(batch_size))
            .min(total_keys);
        let end_line = if shard_index + 1 == shard_count {
            total_keys
        } else {
            start_line.saturating_add(batch_size).min(total_keys)
        };

        Ok(Self {
            shard_count,
            shard_index,
            skip,
            total_keys,
            batch_size,
            start_line,
            end_line,
        })
    }

    /// Number of records this shard will visit.
    pub fn len(&self) -> u64 {
        self.end_line.saturating_sub(self.start_line)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_last(&self) -> bool {
        self.shard_index + 1 == self.shard_count
    }

    /// Whether the record at 1-based `line` belongs to this shard.
    pub fn contains_line(&self, line: u64) -> bool {
        line > self.start_line && line <= self.end_line
    }

    /// Human label, e.g. `Shard 1/4`.
    pub fn label(&self) -> String {
        format!("Shard {}/{}", self.shard_index + 1, self.shard_count)
    }
}

/// Plans every shard of a split, in index order.
pub fn plan_all(
    total_keys: u64,
    shard_count: u32,
    skip: u64,
) -> Result<Vec<ShardPlan>, ShardSpecError> {
    (0..shard_count.max(1))
        .map(|i| ShardPlan::plan(total_keys, shard_count, i, skip))
        .collect()
}
