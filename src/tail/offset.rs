use std::path::Path;

use crate::error::{Result, TailError};

/// Lengths observed on two consecutive ticks.
///
/// `current < previous` is possible when the file was truncated or replaced;
/// nothing here corrects for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPair {
    pub previous: u64,
    pub current: u64,
}

impl OffsetPair {
    /// Number of bytes appended since the previous tick.
    pub fn delta_len(&self) -> u64 {
        self.current.saturating_sub(self.previous)
    }

    pub fn is_shrink(&self) -> bool {
        self.current < self.previous
    }
}

/// Current byte length of the file at `path`.
pub fn file_length(path: &Path) -> Result<u64> {
    std::fs::metadata(path)
        .map(|metadata| metadata.len())
        .map_err(|source| TailError::Inaccessible {
            path: path.to_path_buf(),
            source,
        })
}

/// Remembers the file length seen on the last tick.
#[derive(Debug)]
pub struct OffsetTracker {
    last_length: u64,
}

impl OffsetTracker {
    pub fn new(initial_length: u64) -> Self {
        Self {
            last_length: initial_length,
        }
    }

    /// Seeds the tracker with the file's length right now, so that content
    /// already in the file is never reported.
    pub fn seed(path: &Path) -> Result<Self> {
        Ok(Self::new(file_length(path)?))
    }

    pub fn last_length(&self) -> u64 {
        self.last_length
    }

    /// Records `current` as the new baseline and returns it paired with the
    /// previous one.
    pub fn advance(&mut self, current: u64) -> OffsetPair {
        let pair = OffsetPair {
            previous: self.last_length,
            current,
        };
        self.last_length = current;
        pair
    }

    /// Probes the file and advances to its current length. The baseline is
    /// left untouched if the probe fails.
    pub fn observe(&mut self, path: &Path) -> Result<OffsetPair> {
        let current = file_length(path)?;
        Ok(self.advance(current))
    }

    /// Undoes `advance` for `pair` so its region is read again next tick.
    pub fn rewind(&mut self, pair: OffsetPair) {
        self.last_length = pair.previous;
    }

    /// Moves the baseline back to `offset` when only part of the region was
    /// consumed; the rest is read again next tick.
    pub fn hold_back(&mut self, offset: u64) {
        self.last_length = self.last_length.min(offset);
    }
}
