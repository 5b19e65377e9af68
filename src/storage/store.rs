//! In-Process Store
//!
//! `MemoryStore` realizes the three logical tables over `DashMap`s. The
//! uniqueness constraint on `(domain, category, cluster, element)` is
//! enforced with an atomic insert-if-vacant on the addresses table, so two
//! concurrent reservations of the same slot can never both succeed.

use super::types::{AddressRow, AddressedEntry};
use crate::address::allocator::normalize_key;
use crate::address::types::Address;
use crate::coordinator::types::{WorkId, WorkUnit, WorkerRecord, now_ms};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

pub struct MemoryStore {
    /// `addresses` table, keyed by the packed 4-byte address.
    addresses: DashMap<(u8, u8, u8, u8), AddressRow>,
    /// Extraction output, keyed by `(language, normalized key)`.
    entries: DashMap<(String, String), AddressedEntry>,
    /// `work_units` table.
    work_units: DashMap<WorkId, WorkUnit>,
    /// `worker_status` table.
    workers: DashMap<String, WorkerRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            addresses: DashMap::new(),
            entries: DashMap::new(),
            work_units: DashMap::new(),
            workers: DashMap::new(),
        }
    }

    // --- addresses ---

    /// Atomically claims an address for a key. Returns true if the slot was
    /// free or already held by the same key (idempotent re-reserve), false
    /// if another key owns it.
    pub fn reserve_address(&self, address: Address, key: &str, reserved_by: &str) -> bool {
        let packed = (
            address.domain,
            address.category,
            address.cluster,
            address.element,
        );
        let normalized = normalize_key(key);

        match self.addresses.entry(packed) {
            Entry::Occupied(existing) => existing.get().key == normalized,
            Entry::Vacant(vacant) => {
                vacant.insert(AddressRow {
                    key: normalized,
                    reserved_by: reserved_by.to_string(),
                    reserved_at: now_ms(),
                });
                true
            }
        }
    }

    pub fn address_row(&self, address: Address) -> Option<AddressRow> {
        self.addresses
            .get(&(
                address.domain,
                address.category,
                address.cluster,
                address.element,
            ))
            .map(|row| row.clone())
    }

    /// All persisted address rows, for re-seeding an allocator on restart.
    pub fn address_rows(&self) -> Vec<(Address, AddressRow)> {
        self.addresses
            .iter()
            .map(|entry| {
                let (domain, category, cluster, element) = *entry.key();
                (
                    Address::new(domain, category, cluster, element),
                    entry.value().clone(),
                )
            })
            .collect()
    }

    // --- entries ---

    /// Persists a batch of addressed entries. Re-submitted keys overwrite in
    /// place; the return value counts entries that were new.
    pub fn store_entries(&self, batch: &[AddressedEntry]) -> usize {
        let mut stored = 0;
        for entry in batch {
            let key = (entry.language.clone(), normalize_key(&entry.key));
            if self.entries.insert(key, entry.clone()).is_none() {
                stored += 1;
            }
        }
        stored
    }

    pub fn lookup_entry(&self, language: &str, key: &str) -> Option<AddressedEntry> {
        self.entries
            .get(&(language.to_string(), normalize_key(key)))
            .map(|entry| entry.clone())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    // --- work units ---

    pub fn save_work_unit(&self, unit: &WorkUnit) {
        self.work_units.insert(unit.id.clone(), unit.clone());
    }

    pub fn load_work_units(&self) -> Vec<WorkUnit> {
        self.work_units
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    // --- worker status ---

    pub fn save_worker(&self, record: &WorkerRecord) {
        self.workers.insert(record.id.clone(), record.clone());
    }

    pub fn load_workers(&self) -> Vec<WorkerRecord> {
        self.workers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
