//! Distributed Work Coordinator Module
//!
//! The single master of the extraction run. It owns the work-unit queue and
//! the worker registry, and exposes the HTTP surface workers consume.
//!
//! ## Architecture Overview
//! The coordinator follows a **pull-based** model:
//! 1. **Planning**: work units are created once at startup (planned from a
//!    key span or loaded from a manifest) and persisted to storage.
//! 2. **Assignment**: workers poll `GET /work`; the first pending unit is
//!    handed out FIFO with an atomic check-and-set, so concurrent polls can
//!    never double-assign a unit.
//! 3. **Tracking**: progress reports and idempotent re-registrations double
//!    as heartbeats; `GET /status` derives the global aggregate view.
//! 4. **Completion**: terminal units move to a completed log; the global
//!    processed total only grows on success.
//!
//! ## Submodules
//! - **`types`**: work-unit and worker records plus their state machines.
//! - **`master`**: the `WorkCoordinator` core and liveness sweep.
//! - **`handlers`**: axum handlers for the worker-facing endpoints.
//! - **`protocol`**: endpoint constants and wire DTOs.

pub mod handlers;
pub mod master;
pub mod protocol;
pub mod types;

#[cfg(test)]
mod tests;
