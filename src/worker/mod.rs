//! Extraction Worker Module
//!
//! The client side of the cluster: each worker polls the coordinator for
//! work units and processes them through the extract -> classify -> allocate
//! -> persist pipeline.
//!
//! ## Responsibilities
//! - **Coordination**: registration, polling, progress and completion calls
//!   against the coordinator's HTTP surface, with retry and backoff.
//! - **Processing**: bounded batches over the unit's key range; per-record
//!   failures are skipped and reported, never fatal to the unit.
//! - **Durability**: batches that cannot reach primary storage land in a
//!   local spill file for later replay.
//! - **Liveness**: a dedicated heartbeat task, decoupled from batch timing.
//!
//! ## Submodules
//! - **`client`**: typed HTTP client for the coordinator protocol.
//! - **`extractor`**: the worker loop and batch pipeline.

pub mod client;
pub mod extractor;

#[cfg(test)]
mod tests;
