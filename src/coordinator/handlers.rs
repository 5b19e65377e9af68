use super::master::WorkCoordinator;
use super::protocol::*;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use std::sync::Arc;

pub async fn handle_register(
    Extension(coordinator): Extension<Arc<WorkCoordinator>>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<AckResponse>) {
    if req.worker_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AckResponse::rejected("worker_id must not be empty")),
        );
    }

    coordinator.register_worker(&req.worker_id, &req.address);
    (StatusCode::OK, Json(AckResponse::ok()))
}

/// `GET /work?worker_id=...` — the assigned unit as JSON, or 204 with no
/// body when nothing is pending.
pub async fn handle_request_work(
    Extension(coordinator): Extension<Arc<WorkCoordinator>>,
    Query(query): Query<WorkQuery>,
) -> Response {
    match coordinator.request_work(&query.worker_id) {
        Ok(Some(unit)) => (StatusCode::OK, Json(unit)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::warn!("Rejected work request from {}: {}", query.worker_id, e);
            (
                StatusCode::BAD_REQUEST,
                Json(AckResponse::rejected(e.to_string())),
            )
                .into_response()
        }
    }
}

pub async fn handle_progress(
    Extension(coordinator): Extension<Arc<WorkCoordinator>>,
    Json(req): Json<ProgressRequest>,
) -> (StatusCode, Json<AckResponse>) {
    match coordinator.report_progress(
        &req.worker_id,
        &req.work_id,
        req.entries_processed,
        req.processing_rate,
    ) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => {
            tracing::warn!("Rejected progress report: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(AckResponse::rejected(e.to_string())),
            )
        }
    }
}

pub async fn handle_complete(
    Extension(coordinator): Extension<Arc<WorkCoordinator>>,
    Json(req): Json<CompleteRequest>,
) -> (StatusCode, Json<AckResponse>) {
    match coordinator.complete_work(
        &req.worker_id,
        &req.work_id,
        req.success,
        req.final_count,
        req.errors,
    ) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => {
            tracing::warn!("Rejected completion report: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(AckResponse::rejected(e.to_string())),
            )
        }
    }
}

pub async fn handle_status(
    Extension(coordinator): Extension<Arc<WorkCoordinator>>,
) -> Json<StatusResponse> {
    Json(coordinator.status_snapshot())
}

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Fallback ingestion path for workers without direct storage access.
pub async fn handle_store_entries(
    Extension(coordinator): Extension<Arc<WorkCoordinator>>,
    Json(req): Json<StoreEntriesRequest>,
) -> (StatusCode, Json<StoreEntriesResponse>) {
    let stored = coordinator.ingest_entries(&req.worker_id, &req.entries);
    (
        StatusCode::OK,
        Json(StoreEntriesResponse {
            success: true,
            stored,
        }),
    )
}
