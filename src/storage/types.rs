use crate::address::types::Address;
use serde::{Deserialize, Serialize};

/// One fully addressed extraction result, as persisted and as shipped over
/// the `/store_entries` fallback path.
///
/// Category and cluster are carried by name alongside the packed address so
/// downstream consumers do not need the taxonomy tables to read a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressedEntry {
    pub key: String,
    pub lemma: String,
    pub language: String,
    pub address: Address,
    pub category_name: String,
    pub cluster_name: String,
    pub taxonomy_version: String,
}

/// Row in the `addresses` table: who holds an element slot and since when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRow {
    pub key: String,
    pub reserved_by: String,
    pub reserved_at: u64,
}
