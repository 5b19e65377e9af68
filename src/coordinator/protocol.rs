//! Coordinator Wire Protocol
//!
//! Endpoint constants and Data Transfer Objects for the worker-facing HTTP
//! surface. JSON bodies throughout; `GET /work` answers 204 with no body
//! when the queue is empty, which clients must treat as "no work", not as
//! an error.

use super::types::{WorkId, WorkStatus, WorkerState};
use crate::storage::types::AddressedEntry;
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_REGISTER: &str = "/register";
pub const ENDPOINT_WORK: &str = "/work";
pub const ENDPOINT_PROGRESS: &str = "/progress";
pub const ENDPOINT_COMPLETE: &str = "/complete";
pub const ENDPOINT_STATUS: &str = "/status";
pub const ENDPOINT_HEALTH: &str = "/health";
pub const ENDPOINT_STORE_ENTRIES: &str = "/store_entries";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub worker_id: String,
    pub address: String,
}

/// Generic acknowledgment. `error` is populated on rejected calls so
/// validation failures are explicit, never silent.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkQuery {
    pub worker_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub worker_id: String,
    pub work_id: WorkId,
    pub entries_processed: u64,
    pub processing_rate: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteRequest {
    pub worker_id: String,
    pub work_id: WorkId,
    pub success: bool,
    pub final_count: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreEntriesRequest {
    pub worker_id: String,
    pub entries: Vec<AddressedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreEntriesResponse {
    pub success: bool,
    pub stored: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// --- /status aggregate ---

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOverview {
    pub total_units: usize,
    pub pending: usize,
    pub assigned: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total_processed_entries: u64,
    pub workers_total: usize,
    pub workers_alive: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnitSummary {
    pub id: WorkId,
    pub language: String,
    pub status: WorkStatus,
    pub assigned_worker: Option<String>,
    pub entries_processed: u64,
    pub processing_rate: f64,
    pub error_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub id: String,
    pub address: String,
    pub state: WorkerState,
    pub current_work: Option<WorkId>,
    pub seconds_since_heartbeat: u64,
    pub total_processed: u64,
    pub average_rate: f64,
}

/// Read-only aggregate snapshot returned by `GET /status`. Purely derived;
/// computing it has no side effects.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub overview: StatusOverview,
    pub progress_percent: f64,
    /// Seconds until completion at the current aggregate rate, if any
    /// worker is reporting a rate.
    pub eta_seconds: Option<u64>,
    pub units: Vec<UnitSummary>,
    pub workers: Vec<WorkerSummary>,
}
