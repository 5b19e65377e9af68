//! Distributed Lexical Extraction Library
//!
//! This library crate defines the core modules of the extraction cluster.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of six loosely coupled subsystems:
//!
//! - **`address`**: The semantic address space. Allocates unique 4-byte
//!   `domain:category:cluster:element` addresses deterministically, with
//!   bounded linear probing and explicit overflow policies.
//! - **`classify`**: Pluggable classification of raw records onto the fixed
//!   taxonomy, behind the `Classifier` trait.
//! - **`coordinator`**: The master of a distributed run. Owns the work-unit
//!   queue, the worker registry, and the worker-facing HTTP surface.
//! - **`source`**: The boundary to the dictionary being extracted, behind
//!   the `LexicalSource` trait.
//! - **`storage`**: The persistence layer. Enforces the address uniqueness
//!   constraint and holds entries, work units and worker status; includes
//!   the local spill fallback.
//! - **`worker`**: The extraction client. Polls for work units and runs the
//!   extract -> classify -> allocate -> persist pipeline.

pub mod address;
pub mod classify;
pub mod coordinator;
pub mod source;
pub mod storage;
pub mod worker;
