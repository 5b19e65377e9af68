//! Lookup Classifier
//!
//! Exact-match table from normalized lexical key to taxonomy codes, for
//! curated gold lists or precomputed classifications. Keys not in the table
//! are an error so the caller can fall back or skip explicitly.

use super::Classifier;
use crate::address::allocator::normalize_key;
use crate::source::RawLexicalRecord;
use anyhow::{Result, bail};
use std::collections::HashMap;

pub struct LookupClassifier {
    table: HashMap<String, (u8, u8)>,
}

impl LookupClassifier {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (String, (u8, u8))>) -> Self {
        Self {
            table: entries
                .into_iter()
                .map(|(key, codes)| (normalize_key(&key), codes))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: &str, category: u8, cluster: u8) {
        self.table.insert(normalize_key(key), (category, cluster));
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for LookupClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LookupClassifier {
    fn classify(&self, record: &RawLexicalRecord) -> Result<(u8, u8)> {
        if record.key.trim().is_empty() {
            bail!("record has empty lexical key");
        }

        match self.table.get(&normalize_key(&record.key)) {
            Some(codes) => Ok(*codes),
            None => bail!("no classification entry for '{}'", record.key),
        }
    }
}
