use serde::{Deserialize, Serialize};

/// Unique identifier for a work unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WorkId(pub String);

impl WorkId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for WorkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a work unit.
///
/// Transitions are strictly `Pending -> Assigned -> Processing ->
/// {Completed | Failed}`; terminal units move to the completed log and are
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WorkStatus {
    /// Waiting in the queue, not yet handed to any worker.
    Pending,
    /// Handed to a worker; no progress reported yet.
    Assigned,
    /// The assigned worker has reported at least one progress update.
    Processing,
    /// Terminal: the worker finished the whole range.
    Completed,
    /// Terminal: the worker reported failure for the unit.
    Failed,
}

/// A bounded slice of the extraction task, assignable to one worker at a
/// time. Mutated only by the coordinator in response to worker calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    pub id: WorkId,
    pub language: String,
    pub source: String,
    pub range_start: u64,
    pub range_end: u64,
    pub estimated_size: u64,
    pub status: WorkStatus,
    pub assigned_worker: Option<String>,
    pub assigned_at: Option<u64>,
    pub entries_processed: u64,
    pub processing_rate: f64,
    pub errors: Vec<String>,
    pub created_at: u64,
    pub completed_at: Option<u64>,
}

impl WorkUnit {
    pub fn new(language: &str, source: &str, range_start: u64, range_end: u64) -> Self {
        Self {
            id: WorkId::new(),
            language: language.to_string(),
            source: source.to_string(),
            range_start,
            range_end,
            estimated_size: range_end.saturating_sub(range_start),
            status: WorkStatus::Pending,
            assigned_worker: None,
            assigned_at: None,
            entries_processed: 0,
            processing_rate: 0.0,
            errors: Vec::new(),
            created_at: now_ms(),
            completed_at: None,
        }
    }

    /// Splits a key span into fixed-size units, created once at coordinator
    /// start.
    pub fn plan_units(language: &str, source: &str, span: u64, unit_size: u64) -> Vec<WorkUnit> {
        let mut units = Vec::new();
        let mut start = 0;
        while start < span {
            let end = (start + unit_size).min(span);
            units.push(WorkUnit::new(language, source, start, end));
            start = end;
        }
        units
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, WorkStatus::Completed | WorkStatus::Failed)
    }
}

/// Worker lifecycle state as tracked by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WorkerState {
    Idle,
    Working,
    Error,
    /// Heartbeat older than the liveness threshold. Flagged only; the
    /// worker's unit is not reassigned unless the requeue sweep is enabled.
    Offline,
}

/// Registry record for one worker, updated on every register, progress and
/// completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: String,
    pub address: String,
    pub state: WorkerState,
    pub current_work: Option<WorkId>,
    pub last_heartbeat: u64,
    pub registered_at: u64,
    pub total_processed: u64,
    pub average_rate: f64,
}

impl WorkerRecord {
    pub fn new(id: &str, address: &str) -> Self {
        let now = now_ms();
        Self {
            id: id.to_string(),
            address: address.to_string(),
            state: WorkerState::Idle,
            current_work: None,
            last_heartbeat: now,
            registered_at: now,
            total_processed: 0,
            average_rate: 0.0,
        }
    }
}

/// Current system time in milliseconds since the epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
