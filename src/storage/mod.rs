//! Storage Collaborator Module
//!
//! Durable recording of extraction output and coordination state. The core
//! treats storage as a collaborator: three logical tables (`addresses`,
//! `work_units`, `worker_status`) with the address-uniqueness constraint
//! enforced here, at the storage layer, rather than by callers.
//!
//! ## Submodules
//! - **`store`**: `MemoryStore`, the in-process realization of the tables.
//! - **`types`**: the persisted `AddressedEntry` row.
//! - **`spill`**: local JSON-lines fallback so no batch is silently dropped
//!   when the primary persistence path is down.

pub mod spill;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
