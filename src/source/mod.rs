//! Lexical Source Module
//!
//! The boundary to the dictionary being extracted. Workers only ever see the
//! `LexicalSource` trait: a restartable, range-addressed record feed. The
//! concrete parser/scraper behind it is a collaborator, not part of the core.
//!
//! ## Implementations
//! - **`JsonLinesSource`**: reads a pre-parsed dump file, one record per line.
//! - **`MemorySource`**: fixed in-memory records for tests and demos.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// One raw dictionary record, as produced by the source-specific parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLexicalRecord {
    /// The lexical key (headword) this record is filed under.
    pub key: String,
    /// Canonical citation form.
    pub lemma: String,
    /// Part-of-speech tag as emitted by the source ("noun", "verb", ...).
    pub pos_tag: String,
    /// Free-text gloss/definition; the classifier's main signal.
    pub gloss: String,
    /// Corpus frequency rank, if the source knows it (1 = most frequent).
    pub frequency_rank: Option<u32>,
}

/// A lazy, restartable sequence of raw lexical records.
///
/// `fetch_batch` returns up to `limit` records starting at offset `start`
/// within the given language's key order; an empty batch means the range is
/// exhausted. Calls are independent, so a worker can resume a unit from any
/// offset after a restart.
pub trait LexicalSource: Send + Sync {
    fn fetch_batch(&self, language: &str, start: u64, limit: usize) -> Result<Vec<RawLexicalRecord>>;
}

/// Source backed by a JSON-lines dump file (one `RawLexicalRecord` per line).
///
/// The file is re-opened per batch; fetches are offset-addressed so the
/// sequence is restartable by construction. Offsets are line offsets, so
/// every line in the window must hold exactly one record: blank or malformed
/// lines are an error, not a skip. Skipping would desynchronize the caller's
/// offset accounting from the file and re-read already-consumed lines.
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LexicalSource for JsonLinesSource {
    fn fetch_batch(&self, _language: &str, start: u64, limit: usize) -> Result<Vec<RawLexicalRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open source dump {:?}", self.path))?;
        let reader = BufReader::new(file);

        let mut records = Vec::with_capacity(limit);
        for (step, line) in reader.lines().skip(start as usize).take(limit).enumerate() {
            let line = line?;
            let offset = start + step as u64;
            if line.trim().is_empty() {
                bail!("blank line at offset {} in source dump {:?}", offset, self.path);
            }
            let record: RawLexicalRecord = serde_json::from_str(&line)
                .with_context(|| format!("malformed record at offset {}", offset))?;
            records.push(record);
        }

        Ok(records)
    }
}

/// Fixed in-memory source for tests and single-process demos.
pub struct MemorySource {
    records: Vec<RawLexicalRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<RawLexicalRecord>) -> Self {
        Self { records }
    }
}

impl LexicalSource for MemorySource {
    fn fetch_batch(&self, _language: &str, start: u64, limit: usize) -> Result<Vec<RawLexicalRecord>> {
        let start = start as usize;
        if start >= self.records.len() {
            return Ok(Vec::new());
        }
        let end = (start + limit).min(self.records.len());
        Ok(self.records[start..end].to_vec())
    }
}
