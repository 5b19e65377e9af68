//! Storage Module Tests
//!
//! Covers the atomic address reservation, entry persistence and the local
//! spill fallback.

#[cfg(test)]
mod tests {
    use crate::address::types::Address;
    use crate::coordinator::types::{WorkStatus, WorkUnit, WorkerRecord};
    use crate::storage::spill::SpillWriter;
    use crate::storage::store::MemoryStore;
    use crate::storage::types::AddressedEntry;
    use std::sync::Arc;

    fn entry(key: &str, address: Address) -> AddressedEntry {
        AddressedEntry {
            key: key.to_string(),
            lemma: key.to_string(),
            language: "de".to_string(),
            address,
            category_name: "physical_object".to_string(),
            cluster_name: "common".to_string(),
            taxonomy_version: "1.0".to_string(),
        }
    }

    // ============================================================
    // Address reservation
    // ============================================================

    #[test]
    fn test_reserve_address_is_exclusive() {
        let store = MemoryStore::new();
        let address = Address::new(0xA0, 0x01, 0x04, 0x10);

        assert!(store.reserve_address(address, "Haus", "w1"));
        assert!(!store.reserve_address(address, "Baum", "w2"));

        let row = store.address_row(address).unwrap();
        assert_eq!(row.key, "haus");
        assert_eq!(row.reserved_by, "w1");
    }

    #[test]
    fn test_reserve_address_same_key_is_idempotent() {
        let store = MemoryStore::new();
        let address = Address::new(0xA0, 0x01, 0x04, 0x10);

        assert!(store.reserve_address(address, "Haus", "w1"));
        // Re-reserving with a different spelling of the same key succeeds.
        assert!(store.reserve_address(address, "  HAUS ", "w2"));
        // The original reservation record is untouched.
        assert_eq!(store.address_row(address).unwrap().reserved_by, "w1");
    }

    #[tokio::test]
    async fn test_concurrent_reservations_yield_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let address = Address::new(0xA0, 0x01, 0x04, 0x10);

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.reserve_address(address, &format!("key{}", i), "w")
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1, "slot must have exactly one owner");
    }

    // ============================================================
    // Entry persistence
    // ============================================================

    #[test]
    fn test_store_entries_counts_only_new_rows() {
        let store = MemoryStore::new();
        let a = entry("Haus", Address::new(0xA0, 0x01, 0x04, 0x10));
        let b = entry("Baum", Address::new(0xA0, 0x01, 0x04, 0x11));

        assert_eq!(store.store_entries(&[a.clone(), b]), 2);
        // Re-submitting overwrites in place but counts as zero new.
        assert_eq!(store.store_entries(&[a]), 0);
        assert_eq!(store.entry_count(), 2);
    }

    #[test]
    fn test_lookup_entry_normalizes_key() {
        let store = MemoryStore::new();
        store.store_entries(&[entry("Haus", Address::new(0xA0, 0x01, 0x04, 0x10))]);

        let found = store.lookup_entry("de", "  HAUS ").unwrap();
        assert_eq!(found.address.to_string(), "0xA0:01:04:10");
        assert!(store.lookup_entry("en", "Haus").is_none());
    }

    #[test]
    fn test_address_rows_roundtrip_for_reseed() {
        let store = MemoryStore::new();
        let address = Address::new(0xA0, 0x01, 0x04, 0x10);
        store.reserve_address(address, "Haus", "w1");

        let rows = store.address_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, address);
        assert_eq!(rows[0].1.key, "haus");
    }

    // ============================================================
    // Work unit and worker persistence
    // ============================================================

    #[test]
    fn test_work_unit_persistence_roundtrip() {
        let store = MemoryStore::new();
        let mut unit = WorkUnit::new("de", "dump", 0, 100);
        unit.status = WorkStatus::Completed;
        unit.entries_processed = 100;
        store.save_work_unit(&unit);

        let loaded = store.load_work_units();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, unit.id);
        assert_eq!(loaded[0].status, WorkStatus::Completed);
        assert_eq!(loaded[0].entries_processed, 100);
    }

    #[test]
    fn test_worker_persistence_upserts() {
        let store = MemoryStore::new();
        let mut record = WorkerRecord::new("w1", "127.0.0.1:7001");
        store.save_worker(&record);

        record.total_processed = 42;
        store.save_worker(&record);

        let loaded = store.load_workers();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].total_processed, 42);
    }

    // ============================================================
    // Spill fallback
    // ============================================================

    #[test]
    fn test_spill_writer_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spill.jsonl");
        let writer = SpillWriter::new(&path);

        let first = vec![entry("Haus", Address::new(0xA0, 0x01, 0x04, 0x10))];
        let second = vec![
            entry("Baum", Address::new(0xA0, 0x01, 0x04, 0x11)),
            entry("Wasser", Address::new(0xA0, 0x18, 0x01, 0x02)),
        ];
        assert_eq!(writer.append_batch(&first).unwrap(), 1);
        assert_eq!(writer.append_batch(&second).unwrap(), 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        let replayed: AddressedEntry = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(replayed.key, "Wasser");
        assert_eq!(replayed.address.to_string(), "0xA0:18:01:02");
    }

    #[test]
    fn test_spill_writer_skips_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spill.jsonl");
        let writer = SpillWriter::new(&path);

        assert_eq!(writer.append_batch(&[]).unwrap(), 0);
        assert!(!path.exists());
    }
}
