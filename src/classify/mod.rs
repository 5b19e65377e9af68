//! Classification Module
//!
//! Maps a raw lexical record onto a `(category, cluster)` code pair from the
//! fixed taxonomy. Classification is a pluggable capability: the allocator
//! and the worker depend only on the `Classifier` trait, so a rule engine, a
//! lookup table or a model can be swapped in without touching the core.
//!
//! ## Submodules
//! - **`rules`**: keyword/regex heuristics over pos tag and gloss text.
//! - **`lookup`**: exact-match table, e.g. a curated gold list.

pub mod lookup;
pub mod rules;

use crate::source::RawLexicalRecord;
use anyhow::Result;

/// The consumed classification contract.
///
/// Must be total and deterministic for a given taxonomy version: the same
/// record always yields the same codes. A malformed or empty record is the
/// one permitted failure; callers skip and record it.
pub trait Classifier: Send + Sync {
    /// Returns `(category, cluster)` codes from the fixed taxonomy.
    fn classify(&self, record: &RawLexicalRecord) -> Result<(u8, u8)>;

    /// Taxonomy version the codes refer to.
    fn taxonomy_version(&self) -> &'static str {
        crate::address::taxonomy::TAXONOMY_VERSION
    }
}
