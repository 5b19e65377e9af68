//! Local Spill Fallback
//!
//! When the primary persistence path is unreachable, the worker appends the
//! batch to a local JSON-lines file instead of dropping it. The file can be
//! replayed into storage later; extraction itself still counts as
//! successful.

use super::types::AddressedEntry;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

pub struct SpillWriter {
    path: PathBuf,
}

impl SpillWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Appends the batch, one JSON object per line. Returns the number of
    /// entries written; the write is flushed before returning.
    pub fn append_batch(&self, batch: &[AddressedEntry]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open spill file {:?}", self.path))?;

        for entry in batch {
            let line = serde_json::to_string(entry)?;
            writeln!(file, "{}", line)?;
        }
        file.flush()?;

        tracing::warn!(
            "spilled {} entries to {:?} (primary storage unavailable)",
            batch.len(),
            self.path
        );

        Ok(batch.len())
    }
}
