//! Semantic Address Space Module
//!
//! Owns the 4-byte semantic address format and its allocation logic.
//!
//! ## Core Concepts
//! - **Address**: an immutable `(domain, category, cluster, element)` value,
//!   serialized as `"0xDD:CC:EE:XX"`. The domain byte namespaces a language,
//!   the category/cluster bytes come from the fixed taxonomy, and the element
//!   byte is the per-triple concept slot.
//! - **Taxonomy**: the read-only, versioned enumeration of universal semantic
//!   categories and hierarchical clusters.
//! - **Allocation**: deterministic hash-start + linear-probe slot assignment
//!   with an idempotence cache, so the same lexical key always maps to the
//!   same address.
//!
//! ## Submodules
//! - **`types`**: The `Address` value, wire format, and reserved elements.
//! - **`taxonomy`**: Category and cluster tables with code/name resolution.
//! - **`allocator`**: The `AddressAllocator` managing slot state and overflow.

pub mod allocator;
pub mod taxonomy;
pub mod types;
