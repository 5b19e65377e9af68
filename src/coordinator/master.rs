//! Work Coordination Core
//!
//! The single master owning the work-unit queue and the worker registry.
//! All queue and registry mutations are short, per-entry operations on
//! `DashMap`s; the `pending -> assigned` hand-off is a check-and-set under
//! the unit's entry lock, so two workers racing on `request_work` can never
//! be given the same unit.
//!
//! Lock discipline: a method never holds a `units` guard and a `workers`
//! guard at the same time. Unit state is updated and the guard dropped
//! before the worker record is touched.

use super::protocol::{
    StatusOverview, StatusResponse, UnitSummary, WorkerSummary,
};
use super::types::{WorkId, WorkStatus, WorkUnit, WorkerRecord, WorkerState, now_ms};
use crate::storage::store::MemoryStore;
use crate::storage::types::AddressedEntry;

use anyhow::{Context, Result, bail};
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Coordinator tuning knobs.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// A worker whose heartbeat is older than this is flagged offline.
    pub liveness_timeout: Duration,
    /// Interval of the background liveness sweep.
    pub sweep_interval: Duration,
    /// Whether the sweep also requeues units owned by offline workers.
    /// Off by default: the historical behavior leaves such units stuck, and
    /// operators opt in to the reassignment policy explicitly.
    pub requeue_stale: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            requeue_stale: false,
        }
    }
}

/// Unit shape accepted from a JSON manifest file.
#[derive(Debug, Deserialize)]
struct ManifestUnit {
    language: String,
    source: String,
    range_start: u64,
    range_end: u64,
}

/// The Distributed Work Coordinator.
pub struct WorkCoordinator {
    config: CoordinatorConfig,
    units: DashMap<WorkId, WorkUnit>,
    /// FIFO assignment order, fixed at construction.
    unit_order: Vec<WorkId>,
    completed_log: RwLock<Vec<WorkId>>,
    workers: DashMap<String, WorkerRecord>,
    total_processed: AtomicU64,
    started_at: u64,
    store: Arc<MemoryStore>,
}

impl WorkCoordinator {
    /// Creates the coordinator with its full unit queue. Units are persisted
    /// immediately so a restart can reload queue state.
    pub fn new(
        units: Vec<WorkUnit>,
        store: Arc<MemoryStore>,
        config: CoordinatorConfig,
    ) -> Arc<Self> {
        let unit_order: Vec<WorkId> = units.iter().map(|unit| unit.id.clone()).collect();
        let map = DashMap::new();
        for unit in units {
            store.save_work_unit(&unit);
            map.insert(unit.id.clone(), unit);
        }

        tracing::info!("Coordinator created with {} work units", unit_order.len());

        Arc::new(Self {
            config,
            units: map,
            unit_order,
            completed_log: RwLock::new(Vec::new()),
            workers: DashMap::new(),
            total_processed: AtomicU64::new(0),
            started_at: now_ms(),
            store,
        })
    }

    /// Reads a unit manifest: a JSON array of
    /// `{language, source, range_start, range_end}` objects.
    pub fn load_manifest(path: &str) -> Result<Vec<WorkUnit>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path))?;
        let manifest: Vec<ManifestUnit> =
            serde_json::from_str(&raw).context("malformed unit manifest")?;

        Ok(manifest
            .into_iter()
            .map(|m| WorkUnit::new(&m.language, &m.source, m.range_start, m.range_end))
            .collect())
    }

    /// Rebuilds the queue from units previously persisted to the store.
    /// In-flight assignment state is only as fresh as the last persist.
    pub fn resume(store: Arc<MemoryStore>, config: CoordinatorConfig) -> Arc<Self> {
        let mut units = store.load_work_units();
        units.sort_by_key(|unit| unit.created_at);

        let completed: Vec<WorkId> = units
            .iter()
            .filter(|unit| unit.is_terminal())
            .map(|unit| unit.id.clone())
            .collect();
        let recovered_total: u64 = units
            .iter()
            .filter(|unit| unit.status == WorkStatus::Completed)
            .map(|unit| unit.entries_processed)
            .sum();

        tracing::info!(
            "Resuming coordinator: {} units ({} terminal) from store",
            units.len(),
            completed.len()
        );

        let coordinator = Self::new(units, store, config);
        *coordinator.completed_log.write().unwrap_or_else(|e| e.into_inner()) = completed;
        coordinator
            .total_processed
            .store(recovered_total, Ordering::Relaxed);
        coordinator
    }

    // --- worker-facing operations ---

    /// Idempotent worker upsert. Re-registration refreshes the heartbeat and
    /// address but keeps accumulated totals, which is what makes this call
    /// double as the heartbeat path.
    pub fn register_worker(&self, worker_id: &str, address: &str) {
        let record = match self.workers.get_mut(worker_id) {
            Some(mut existing) => {
                existing.last_heartbeat = now_ms();
                existing.address = address.to_string();
                if existing.state == WorkerState::Offline {
                    tracing::info!("Worker {} back online", worker_id);
                    existing.state = if existing.current_work.is_some() {
                        WorkerState::Working
                    } else {
                        WorkerState::Idle
                    };
                }
                existing.clone()
            }
            None => {
                tracing::info!("Registered worker {} at {}", worker_id, address);
                let record = WorkerRecord::new(worker_id, address);
                self.workers.insert(worker_id.to_string(), record.clone());
                record
            }
        };

        self.store.save_worker(&record);
    }

    /// Hands the first pending unit to the worker, FIFO over the unit list.
    /// Returns `None` (not an error) when the queue has nothing pending.
    pub fn request_work(&self, worker_id: &str) -> Result<Option<WorkUnit>> {
        if !self.workers.contains_key(worker_id) {
            bail!("unknown worker '{}': register first", worker_id);
        }

        for unit_id in &self.unit_order {
            let claimed = {
                let Some(mut unit) = self.units.get_mut(unit_id) else {
                    continue;
                };
                // Atomic check-and-set under the entry lock: this is what
                // rules out double assignment under concurrent requests.
                if unit.status != WorkStatus::Pending {
                    continue;
                }
                unit.status = WorkStatus::Assigned;
                unit.assigned_worker = Some(worker_id.to_string());
                unit.assigned_at = Some(now_ms());
                unit.clone()
            };

            tracing::info!("Assigned unit {} to worker {}", claimed.id.0, worker_id);
            self.store.save_work_unit(&claimed);

            if let Some(mut worker) = self.workers.get_mut(worker_id) {
                worker.state = WorkerState::Working;
                worker.current_work = Some(claimed.id.clone());
                worker.last_heartbeat = now_ms();
                self.store.save_worker(&worker);
            }

            return Ok(Some(claimed));
        }

        Ok(None)
    }

    /// Records a progress report, transitioning the unit to `Processing` on
    /// the first call. Counters only move forward here; the terminal numbers
    /// arrive with `complete_work`.
    pub fn report_progress(
        &self,
        worker_id: &str,
        work_id: &WorkId,
        entries_processed: u64,
        processing_rate: f64,
    ) -> Result<()> {
        let updated = {
            let Some(mut unit) = self.units.get_mut(work_id) else {
                bail!("progress for unknown work unit {}", work_id.0);
            };

            if !matches!(unit.status, WorkStatus::Assigned | WorkStatus::Processing) {
                bail!(
                    "progress rejected: unit {} is {:?}",
                    work_id.0,
                    unit.status
                );
            }
            if unit.assigned_worker.as_deref() != Some(worker_id) {
                bail!(
                    "progress rejected: unit {} is not assigned to worker {}",
                    work_id.0,
                    worker_id
                );
            }

            if unit.status == WorkStatus::Assigned {
                tracing::debug!("Unit {} now processing", work_id.0);
                unit.status = WorkStatus::Processing;
            }

            unit.entries_processed = unit.entries_processed.max(entries_processed);
            unit.processing_rate = processing_rate;
            unit.clone()
        };

        self.store.save_work_unit(&updated);

        if let Some(mut worker) = self.workers.get_mut(worker_id) {
            worker.last_heartbeat = now_ms();
            worker.average_rate = if worker.average_rate == 0.0 {
                processing_rate
            } else {
                (worker.average_rate + processing_rate) / 2.0
            };
            self.store.save_worker(&worker);
        }

        Ok(())
    }

    /// Terminal transition for a unit. The global processed total moves only
    /// on success; the worker goes back to idle either way.
    pub fn complete_work(
        &self,
        worker_id: &str,
        work_id: &WorkId,
        success: bool,
        final_count: u64,
        errors: Vec<String>,
    ) -> Result<()> {
        let finished = {
            let Some(mut unit) = self.units.get_mut(work_id) else {
                bail!("completion for unknown work unit {}", work_id.0);
            };

            if unit.is_terminal() {
                bail!("unit {} already terminal ({:?})", work_id.0, unit.status);
            }
            if unit.assigned_worker.as_deref() != Some(worker_id) {
                bail!(
                    "completion rejected: unit {} is not assigned to worker {}",
                    work_id.0,
                    worker_id
                );
            }

            unit.status = if success {
                WorkStatus::Completed
            } else {
                WorkStatus::Failed
            };
            unit.entries_processed = final_count;
            unit.errors.extend(errors);
            unit.completed_at = Some(now_ms());
            unit.clone()
        };

        if success {
            self.total_processed.fetch_add(final_count, Ordering::Relaxed);
            tracing::info!(
                "Unit {} completed by {} ({} entries, {} record errors)",
                work_id.0,
                worker_id,
                final_count,
                finished.errors.len()
            );
        } else {
            tracing::error!(
                "Unit {} failed on {}: {:?}",
                work_id.0,
                worker_id,
                finished.errors
            );
        }

        self.store.save_work_unit(&finished);
        self.completed_log
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(work_id.clone());

        if let Some(mut worker) = self.workers.get_mut(worker_id) {
            worker.state = WorkerState::Idle;
            worker.current_work = None;
            worker.last_heartbeat = now_ms();
            if success {
                worker.total_processed += final_count;
            }
            self.store.save_worker(&worker);
        }

        Ok(())
    }

    /// Persists a batch shipped over `/store_entries` by a worker without
    /// direct storage access. Address slots are claimed in the store's
    /// addresses table as a side effect; a conflicting claim means the
    /// overflow policy reused a slot and is logged, not rejected.
    pub fn ingest_entries(&self, worker_id: &str, entries: &[AddressedEntry]) -> usize {
        for entry in entries {
            if !self.store.reserve_address(entry.address, &entry.key, worker_id) {
                tracing::warn!(
                    "address {} already reserved by a different key (entry '{}')",
                    entry.address,
                    entry.key
                );
            }
        }
        let stored = self.store.store_entries(entries);
        tracing::debug!(
            "Stored {}/{} entries from worker {}",
            stored,
            entries.len(),
            worker_id
        );
        stored
    }

    // --- read-only aggregation ---

    /// Total entries from successfully completed units. Non-decreasing.
    pub fn total_processed_entries(&self) -> u64 {
        self.total_processed.load(Ordering::Relaxed)
    }

    pub fn status_snapshot(&self) -> StatusResponse {
        let now = now_ms();
        let liveness_ms = self.config.liveness_timeout.as_millis() as u64;

        let mut pending = 0;
        let mut assigned = 0;
        let mut processing = 0;
        let mut completed = 0;
        let mut failed = 0;
        let mut total_estimated: u64 = 0;
        let mut in_flight: u64 = 0;

        let mut units = Vec::with_capacity(self.unit_order.len());
        for entry in self.units.iter() {
            let unit = entry.value();
            total_estimated += unit.estimated_size;
            match unit.status {
                WorkStatus::Pending => pending += 1,
                WorkStatus::Assigned => assigned += 1,
                WorkStatus::Processing => {
                    processing += 1;
                    in_flight += unit.entries_processed;
                }
                WorkStatus::Completed => completed += 1,
                WorkStatus::Failed => failed += 1,
            }
            units.push(UnitSummary {
                id: unit.id.clone(),
                language: unit.language.clone(),
                status: unit.status.clone(),
                assigned_worker: unit.assigned_worker.clone(),
                entries_processed: unit.entries_processed,
                processing_rate: unit.processing_rate,
                error_count: unit.errors.len(),
            });
        }

        let mut workers = Vec::with_capacity(self.workers.len());
        let mut workers_alive = 0;
        let mut aggregate_rate = 0.0;
        for entry in self.workers.iter() {
            let worker = entry.value();
            let heartbeat_age = now.saturating_sub(worker.last_heartbeat);
            if heartbeat_age <= liveness_ms {
                workers_alive += 1;
                if worker.state == WorkerState::Working {
                    aggregate_rate += worker.average_rate;
                }
            }
            workers.push(WorkerSummary {
                id: worker.id.clone(),
                address: worker.address.clone(),
                state: worker.state.clone(),
                current_work: worker.current_work.clone(),
                seconds_since_heartbeat: heartbeat_age / 1000,
                total_processed: worker.total_processed,
                average_rate: worker.average_rate,
            });
        }

        let done = self.total_processed.load(Ordering::Relaxed) + in_flight;
        let progress_percent = if total_estimated > 0 {
            ((done as f64 / total_estimated as f64) * 100.0).min(100.0)
        } else {
            0.0
        };
        let remaining = total_estimated.saturating_sub(done);
        let eta_seconds = if aggregate_rate > 0.0 && remaining > 0 {
            Some((remaining as f64 / aggregate_rate).ceil() as u64)
        } else {
            None
        };

        StatusResponse {
            overview: StatusOverview {
                total_units: self.unit_order.len(),
                pending,
                assigned,
                processing,
                completed,
                failed,
                total_processed_entries: self.total_processed.load(Ordering::Relaxed),
                workers_total: self.workers.len(),
                workers_alive,
                elapsed_ms: now.saturating_sub(self.started_at),
            },
            progress_percent,
            eta_seconds,
            units,
            workers,
        }
    }

    // --- liveness ---

    /// One pass of the liveness check: flags workers with stale heartbeats
    /// as offline and, when `requeue_stale` is set, puts their in-flight
    /// units back into the pending queue. Returns the number of requeued
    /// units.
    pub fn sweep_stale(&self) -> usize {
        let now = now_ms();
        let threshold = self.config.liveness_timeout.as_millis() as u64;

        // Phase 1: find stale workers without holding any unit guard.
        let mut stale: Vec<(String, Option<WorkId>)> = Vec::new();
        for entry in self.workers.iter() {
            let worker = entry.value();
            if worker.state != WorkerState::Offline
                && now.saturating_sub(worker.last_heartbeat) > threshold
            {
                stale.push((worker.id.clone(), worker.current_work.clone()));
            }
        }

        if stale.is_empty() {
            return 0;
        }

        // Phase 2: mark offline.
        for (worker_id, _) in &stale {
            if let Some(mut worker) = self.workers.get_mut(worker_id) {
                tracing::warn!("Worker {} has a stale heartbeat, flagging offline", worker_id);
                worker.state = WorkerState::Offline;
                self.store.save_worker(&worker);
            }
        }

        if !self.config.requeue_stale {
            return 0;
        }

        // Phase 3: requeue their in-flight units.
        let mut requeued = 0;
        for (worker_id, work_id) in stale {
            let Some(work_id) = work_id else { continue };
            let reset = {
                let Some(mut unit) = self.units.get_mut(&work_id) else {
                    continue;
                };
                if unit.is_terminal() || unit.assigned_worker.as_deref() != Some(&worker_id) {
                    continue;
                }
                tracing::warn!(
                    "Requeueing unit {} abandoned by offline worker {}",
                    work_id.0,
                    worker_id
                );
                unit.status = WorkStatus::Pending;
                unit.assigned_worker = None;
                unit.assigned_at = None;
                unit.processing_rate = 0.0;
                unit.clone()
            };
            self.store.save_work_unit(&reset);
            if let Some(mut worker) = self.workers.get_mut(&worker_id) {
                worker.current_work = None;
                self.store.save_worker(&worker);
            }
            requeued += 1;
        }

        requeued
    }

    /// Spawns the periodic liveness sweep.
    pub fn spawn_liveness_sweep(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(coordinator.config.sweep_interval);
            loop {
                interval.tick().await;
                let requeued = coordinator.sweep_stale();
                if requeued > 0 {
                    tracing::info!("Liveness sweep requeued {} units", requeued);
                }
            }
        })
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }
}
