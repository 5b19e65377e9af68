//! Extraction Worker
//!
//! The worker-side processing loop: pull a work unit, walk its key range in
//! bounded batches, classify and address every record, persist the results,
//! and report back. Heartbeats run on their own schedule so a long batch
//! never makes the worker look dead.

use super::client::CoordinatorClient;
use crate::address::allocator::AddressAllocator;
use crate::address::taxonomy;
use crate::classify::Classifier;
use crate::coordinator::types::WorkUnit;
use crate::source::{LexicalSource, RawLexicalRecord};
use crate::storage::spill::SpillWriter;
use crate::storage::store::MemoryStore;
use crate::storage::types::AddressedEntry;

use anyhow::{Result, anyhow, bail};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct WorkerConfig {
    pub worker_id: String,
    /// Address reported to the coordinator, for operators reading `/status`.
    pub address: String,
    pub language: String,
    /// Domain byte all addresses allocated by this worker live in.
    pub domain: u8,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub spill_path: PathBuf,
    /// Consecutive failed units before the worker gives up.
    pub max_consecutive_failures: u32,
}

impl WorkerConfig {
    pub fn new(worker_id: &str, address: &str, language: &str, domain: u8) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            address: address.to_string(),
            language: language.to_string(),
            domain,
            batch_size: 200,
            poll_interval: Duration::from_millis(2000),
            heartbeat_interval: Duration::from_millis(10_000),
            spill_path: PathBuf::from(format!("spill-{}.jsonl", worker_id)),
            max_consecutive_failures: 5,
        }
    }
}

/// Where finished batches go.
///
/// `Remote` ships batches to the coordinator over HTTP and spills to the
/// local fallback file when that fails. `Local` writes straight into an
/// in-process store; used by the single-process mode and by tests, and
/// skips progress reporting since there is no coordinator to tell.
pub enum EntrySink {
    Remote,
    Local(Arc<MemoryStore>),
}

/// Result of working through one unit's key range.
pub struct UnitOutcome {
    pub processed: u64,
    pub errors: Vec<String>,
}

pub struct ExtractionWorker {
    config: WorkerConfig,
    client: Arc<CoordinatorClient>,
    source: Arc<dyn LexicalSource>,
    classifier: Arc<dyn Classifier>,
    allocator: Arc<AddressAllocator>,
    sink: EntrySink,
    spill: SpillWriter,
}

impl ExtractionWorker {
    pub fn new(
        config: WorkerConfig,
        client: Arc<CoordinatorClient>,
        source: Arc<dyn LexicalSource>,
        classifier: Arc<dyn Classifier>,
        allocator: Arc<AddressAllocator>,
        sink: EntrySink,
    ) -> Self {
        let spill = SpillWriter::new(config.spill_path.clone());
        Self {
            config,
            client,
            source,
            classifier,
            allocator,
            sink,
            spill,
        }
    }

    /// Registers with the coordinator, then runs the poll loop until the
    /// failure budget is spent. Heartbeats run on a separate task.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        self.client
            .register(&self.config.worker_id, &self.config.address)
            .await?;
        tracing::info!("Worker {} registered", self.config.worker_id);

        self.clone().spawn_heartbeat_loop();

        let mut consecutive_failures = 0u32;
        loop {
            match self.client.request_work(&self.config.worker_id).await {
                Ok(Some(unit)) => {
                    tracing::info!(
                        "Worker {} took unit {} [{}, {})",
                        self.config.worker_id,
                        unit.id.0,
                        unit.range_start,
                        unit.range_end
                    );
                    match self.run_unit(&unit).await {
                        Ok(outcome) => {
                            consecutive_failures = 0;
                            tracing::info!(
                                "Unit {} done: {} entries, {} skipped",
                                unit.id.0,
                                outcome.processed,
                                outcome.errors.len()
                            );
                        }
                        Err(e) => {
                            consecutive_failures += 1;
                            tracing::error!("Unit {} failed: {}", unit.id.0, e);
                            if consecutive_failures >= self.config.max_consecutive_failures {
                                bail!(
                                    "{} consecutive unit failures, giving up",
                                    consecutive_failures
                                );
                            }
                        }
                    }
                }
                Ok(None) => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::warn!("Work poll failed: {}", e);
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        bail!("coordinator unreachable, giving up");
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Heartbeat is an idempotent re-register, so a coordinator restart also
    /// repopulates its registry from live workers.
    fn spawn_heartbeat_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.heartbeat_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self
                    .client
                    .register(&self.config.worker_id, &self.config.address)
                    .await
                {
                    tracing::warn!("Heartbeat failed: {}", e);
                }
            }
        });
    }

    /// Processes one unit end to end and reports the terminal result. The
    /// unit counts as successful even when individual records were skipped
    /// or batches went to the spill file; only an unreadable source fails it.
    async fn run_unit(&self, unit: &WorkUnit) -> Result<UnitOutcome> {
        let result = self.process_unit(unit).await;

        match &result {
            Ok(outcome) => {
                self.client
                    .complete_work(
                        &self.config.worker_id,
                        &unit.id,
                        true,
                        outcome.processed,
                        outcome.errors.clone(),
                    )
                    .await?;
            }
            Err(e) => {
                self.client
                    .complete_work(
                        &self.config.worker_id,
                        &unit.id,
                        false,
                        0,
                        vec![e.to_string()],
                    )
                    .await?;
            }
        }

        result
    }

    /// Walks the unit's key range in batches: fetch, classify, allocate,
    /// persist. Per-record failures are collected and skipped; they never
    /// abort the unit.
    pub async fn process_unit(&self, unit: &WorkUnit) -> Result<UnitOutcome> {
        let mut processed = 0u64;
        let mut errors = Vec::new();
        let mut offset = unit.range_start;
        let started = Instant::now();

        while offset < unit.range_end {
            let remaining = (unit.range_end - offset) as usize;
            let limit = remaining.min(self.config.batch_size);
            let records = self
                .source
                .fetch_batch(&unit.language, offset, limit)?;
            if records.is_empty() {
                break;
            }
            let fetched = records.len() as u64;

            let mut batch = Vec::with_capacity(records.len());
            for record in &records {
                match self.build_entry(record) {
                    Ok(entry) => batch.push(entry),
                    Err(e) => errors.push(format!("{}: {}", record.key, e)),
                }
            }

            self.persist_batch(&batch).await;
            processed += batch.len() as u64;
            offset += fetched;

            if matches!(self.sink, EntrySink::Remote) {
                let rate = processed as f64 / started.elapsed().as_secs_f64().max(0.001);
                if let Err(e) = self
                    .client
                    .report_progress(&self.config.worker_id, &unit.id, processed, rate)
                    .await
                {
                    tracing::warn!("Progress report failed: {}", e);
                }
            }
        }

        Ok(UnitOutcome { processed, errors })
    }

    /// Classifies a record and allocates its address within this worker's
    /// domain.
    fn build_entry(&self, record: &RawLexicalRecord) -> Result<AddressedEntry> {
        let (category, cluster) = self.classifier.classify(record)?;
        let address = self
            .allocator
            .allocate(self.config.domain, category, cluster, &record.key)?;

        let category_name = taxonomy::category_name(category)
            .ok_or_else(|| anyhow!("classifier produced unknown category 0x{:02X}", category))?;
        let cluster_name = taxonomy::cluster_name(cluster)
            .ok_or_else(|| anyhow!("classifier produced unknown cluster 0x{:02X}", cluster))?;

        Ok(AddressedEntry {
            key: record.key.clone(),
            lemma: record.lemma.clone(),
            language: self.config.language.clone(),
            address,
            category_name: category_name.to_string(),
            cluster_name: cluster_name.to_string(),
            taxonomy_version: self.classifier.taxonomy_version().to_string(),
        })
    }

    /// Persists a batch through the configured sink. On the remote path a
    /// failed upload degrades to the local spill file; losing the batch
    /// entirely is the only unacceptable outcome.
    pub async fn persist_batch(&self, batch: &[AddressedEntry]) {
        if batch.is_empty() {
            return;
        }

        match &self.sink {
            EntrySink::Local(store) => {
                store.store_entries(batch);
            }
            EntrySink::Remote => {
                match self
                    .client
                    .store_entries(&self.config.worker_id, batch)
                    .await
                {
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Primary persistence failed: {}", e);
                        if let Err(spill_err) = self.spill.append_batch(batch) {
                            tracing::error!(
                                "Spill fallback also failed, {} entries lost: {}",
                                batch.len(),
                                spill_err
                            );
                        }
                    }
                }
            }
        }
    }
}
