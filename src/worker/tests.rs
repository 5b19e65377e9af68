//! Worker Module Tests
//!
//! Exercises the batch pipeline end to end against an in-memory source and
//! store, plus the spill fallback on the remote persistence path.

#[cfg(test)]
mod tests {
    use crate::address::allocator::{AddressAllocator, OverflowPolicy};
    use crate::classify::rules::RuleBasedClassifier;
    use crate::coordinator::types::WorkUnit;
    use crate::source::{JsonLinesSource, MemorySource, RawLexicalRecord};
    use crate::storage::store::MemoryStore;
    use crate::storage::types::AddressedEntry;
    use crate::worker::client::CoordinatorClient;
    use crate::worker::extractor::{EntrySink, ExtractionWorker, WorkerConfig};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn record(key: &str, pos: &str, gloss: &str, rank: Option<u32>) -> RawLexicalRecord {
        RawLexicalRecord {
            key: key.to_string(),
            lemma: key.to_string(),
            pos_tag: pos.to_string(),
            gloss: gloss.to_string(),
            frequency_rank: rank,
        }
    }

    fn sample_records() -> Vec<RawLexicalRecord> {
        vec![
            record("Wasser", "noun", "a clear liquid", Some(80)),
            record("gehen", "verb", "to walk somewhere", Some(40)),
            record("Haus", "noun", "a building people live in", Some(120)),
            record("laufen", "verb", "to run or move fast", Some(300)),
            record("Idee", "noun", "an abstract thought or concept", Some(900)),
        ]
    }

    fn local_worker(
        records: Vec<RawLexicalRecord>,
        store: Arc<MemoryStore>,
        batch_size: usize,
    ) -> ExtractionWorker {
        let mut config = WorkerConfig::new("w-test", "127.0.0.1:7001", "de", 0xA0);
        config.batch_size = batch_size;
        ExtractionWorker::new(
            config,
            Arc::new(CoordinatorClient::new("http://127.0.0.1:1")),
            Arc::new(MemorySource::new(records)),
            Arc::new(RuleBasedClassifier::new()),
            Arc::new(AddressAllocator::new(OverflowPolicy::default())),
            EntrySink::Local(store),
        )
    }

    // ============================================================
    // Batch pipeline
    // ============================================================

    #[tokio::test]
    async fn test_process_unit_addresses_every_record() {
        let store = Arc::new(MemoryStore::new());
        let worker = local_worker(sample_records(), store.clone(), 2);
        let unit = WorkUnit::new("de", "dump", 0, 5);

        let outcome = worker.process_unit(&unit).await.unwrap();

        assert_eq!(outcome.processed, 5);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.entry_count(), 5);

        let wasser = store.lookup_entry("de", "Wasser").unwrap();
        assert_eq!(wasser.address.domain, 0xA0);
        assert_eq!(wasser.category_name, "liquid");
        assert_eq!(wasser.taxonomy_version, "1.0");
    }

    #[tokio::test]
    async fn test_process_unit_yields_distinct_addresses() {
        let store = Arc::new(MemoryStore::new());
        let worker = local_worker(sample_records(), store.clone(), 200);
        let unit = WorkUnit::new("de", "dump", 0, 5);

        worker.process_unit(&unit).await.unwrap();

        let addresses: HashSet<String> = ["Wasser", "gehen", "Haus", "laufen", "Idee"]
            .iter()
            .map(|key| store.lookup_entry("de", key).unwrap().address.to_string())
            .collect();
        assert_eq!(addresses.len(), 5);
    }

    #[tokio::test]
    async fn test_process_unit_skips_malformed_records() {
        let mut records = sample_records();
        records.insert(2, record("", "noun", "nothing to file this under", None));

        let store = Arc::new(MemoryStore::new());
        let worker = local_worker(records, store.clone(), 200);
        let unit = WorkUnit::new("de", "dump", 0, 6);

        let outcome = worker.process_unit(&unit).await.unwrap();

        // The bad record is reported, the other five still land.
        assert_eq!(outcome.processed, 5);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(store.entry_count(), 5);
    }

    #[tokio::test]
    async fn test_process_unit_respects_range_end() {
        let store = Arc::new(MemoryStore::new());
        let worker = local_worker(sample_records(), store.clone(), 2);
        let unit = WorkUnit::new("de", "dump", 0, 3);

        let outcome = worker.process_unit(&unit).await.unwrap();

        assert_eq!(outcome.processed, 3);
        assert_eq!(store.entry_count(), 3);
        assert!(store.lookup_entry("de", "laufen").is_none());
    }

    #[tokio::test]
    async fn test_process_unit_never_reprocesses_past_a_blank_dump_line() {
        // A blank line must fail the unit instead of shifting the offset
        // accounting: a skip would re-fetch lines already persisted and
        // inflate the processed count.
        let dir = tempfile::tempdir().unwrap();
        let dump_path = dir.path().join("dump.jsonl");
        let lines: Vec<String> = sample_records()
            .into_iter()
            .take(3)
            .map(|r| serde_json::to_string(&r).unwrap())
            .collect();
        let dump = format!("{}\n{}\n\n{}", lines[0], lines[1], lines[2]);
        std::fs::write(&dump_path, dump).unwrap();

        let store = Arc::new(MemoryStore::new());
        let mut config = WorkerConfig::new("w-test", "127.0.0.1:7001", "de", 0xA0);
        config.batch_size = 2;
        let worker = ExtractionWorker::new(
            config,
            Arc::new(CoordinatorClient::new("http://127.0.0.1:1")),
            Arc::new(JsonLinesSource::new(&dump_path)),
            Arc::new(RuleBasedClassifier::new()),
            Arc::new(AddressAllocator::new(OverflowPolicy::default())),
            EntrySink::Local(store.clone()),
        );
        let unit = WorkUnit::new("de", "dump", 0, 4);

        let result = worker.process_unit(&unit).await;

        assert!(result.is_err());
        // Only the clean batch before the blank line was persisted, once.
        assert_eq!(store.entry_count(), 2);
        assert!(store.lookup_entry("de", "Wasser").is_some());
        assert!(store.lookup_entry("de", "gehen").is_some());
        assert!(store.lookup_entry("de", "Haus").is_none());
    }

    #[tokio::test]
    async fn test_process_unit_stops_on_exhausted_source() {
        let store = Arc::new(MemoryStore::new());
        let worker = local_worker(sample_records(), store.clone(), 200);
        // Range is wider than the source actually is.
        let unit = WorkUnit::new("de", "dump", 0, 500);

        let outcome = worker.process_unit(&unit).await.unwrap();
        assert_eq!(outcome.processed, 5);
    }

    // ============================================================
    // Spill fallback
    // ============================================================

    #[tokio::test]
    async fn test_persist_batch_spills_when_coordinator_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let spill_path = dir.path().join("spill.jsonl");

        let mut config = WorkerConfig::new("w-test", "127.0.0.1:7001", "de", 0xA0);
        config.spill_path = spill_path.clone();
        let worker = ExtractionWorker::new(
            config,
            // Port 1 refuses connections, so the remote path fails fast.
            Arc::new(CoordinatorClient::new("http://127.0.0.1:1")),
            Arc::new(MemorySource::new(Vec::new())),
            Arc::new(RuleBasedClassifier::new()),
            Arc::new(AddressAllocator::new(OverflowPolicy::default())),
            EntrySink::Remote,
        );

        let batch = vec![AddressedEntry {
            key: "Wasser".to_string(),
            lemma: "Wasser".to_string(),
            language: "de".to_string(),
            address: crate::address::types::Address::new(0xA0, 0x18, 0x01, 0x02),
            category_name: "liquid".to_string(),
            cluster_name: "ultra_frequent".to_string(),
            taxonomy_version: "1.0".to_string(),
        }];
        worker.persist_batch(&batch).await;

        let contents = std::fs::read_to_string(&spill_path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let replayed: AddressedEntry = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(replayed.key, "Wasser");
    }
}
