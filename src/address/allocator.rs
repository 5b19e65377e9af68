//! Address Allocation Engine
//!
//! Assigns element slots within a `(domain, category, cluster)` triple.
//! The starting slot is derived deterministically from the normalized lexical
//! key, then probed linearly with wraparound, so allocation is reproducible
//! for a given insertion order while spreading keys pseudo-uniformly.
//!
//! ## Guarantees
//! - **Uniqueness**: successful allocations within one triple never collide
//!   until the 254 slots are exhausted.
//! - **Idempotence**: re-submitting a key returns its original address via
//!   the key cache without consuming a new slot.
//! - **Bounded cost**: at most 254 probe steps per allocation.
//!
//! On exhaustion the configured `OverflowPolicy` decides between failing and
//! the documented lossy fallbacks.

use super::taxonomy;
use super::types::{Address, ELEMENT_OVERFLOW, ELEMENT_SLOTS};
use anyhow::{Result, bail};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// What `allocate` does when all 254 slots of a triple are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Return the smallest currently-allocated element. Lossy: the returned
    /// address is shared with another key, trading uniqueness for
    /// availability.
    ReuseSmallest,
    /// Return the reserved `0xFE` overflow element shared by all overflowed
    /// keys of the triple.
    ReservedSlot,
    /// Surface the exhaustion as an error.
    Fail,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::ReuseSmallest
    }
}

/// Counter snapshot exposed by `statistics()`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AllocatorStats {
    pub total_generated: u64,
    pub collisions_resolved: u64,
    pub cache_hits: u64,
    pub overflow_hits: u64,
}

type Triple = (u8, u8, u8);

/// Slot occupancy for one `(domain, category, cluster)` triple.
struct SlotSet {
    used: [bool; ELEMENT_SLOTS],
    allocated: usize,
}

impl SlotSet {
    fn new() -> Self {
        Self {
            used: [false; ELEMENT_SLOTS],
            allocated: 0,
        }
    }

    fn smallest_used(&self) -> Option<u8> {
        self.used
            .iter()
            .position(|&taken| taken)
            .map(|idx| idx as u8)
    }
}

/// The Address Space Manager.
///
/// All state lives in `DashMap`s so workers can allocate concurrently; the
/// reserve-if-available step runs under the triple's entry lock, making the
/// check-and-set atomic per triple.
pub struct AddressAllocator {
    slots: DashMap<Triple, SlotSet>,
    key_cache: DashMap<(Triple, String), Address>,
    policy: OverflowPolicy,
    total_generated: AtomicU64,
    collisions_resolved: AtomicU64,
    cache_hits: AtomicU64,
    overflow_hits: AtomicU64,
}

impl AddressAllocator {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            slots: DashMap::new(),
            key_cache: DashMap::new(),
            policy,
            total_generated: AtomicU64::new(0),
            collisions_resolved: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            overflow_hits: AtomicU64::new(0),
        }
    }

    /// Allocates (or re-reads) the address for a lexical key.
    ///
    /// Fails only on invalid taxonomy codes or, under `OverflowPolicy::Fail`,
    /// on triple exhaustion.
    ///
    /// The key's cache entry is claimed before probing, so two tasks racing
    /// on the same key cannot each consume a slot: one probes, the other
    /// blocks on the entry and reads the cached result.
    pub fn allocate(&self, domain: u8, category: u8, cluster: u8, key: &str) -> Result<Address> {
        if !taxonomy::is_valid_category(category) {
            bail!("unknown category code 0x{:02X}", category);
        }
        if !taxonomy::is_valid_cluster(cluster) {
            bail!("unknown cluster code 0x{:02X}", cluster);
        }

        let triple = (domain, category, cluster);
        let normalized = normalize_key(key);

        let vacant = match self.key_cache.entry((triple, normalized.clone())) {
            Entry::Occupied(existing) => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(*existing.get());
            }
            Entry::Vacant(vacant) => vacant,
        };

        let start = hash_start(&normalized);
        let mut slots = self.slots.entry(triple).or_insert_with(SlotSet::new);

        for step in 0..ELEMENT_SLOTS {
            let element = ((start as usize + step) % ELEMENT_SLOTS) as u8;
            if !slots.used[element as usize] {
                slots.used[element as usize] = true;
                slots.allocated += 1;
                drop(slots);

                if step > 0 {
                    self.collisions_resolved.fetch_add(1, Ordering::Relaxed);
                }
                self.total_generated.fetch_add(1, Ordering::Relaxed);

                let address = Address::new(domain, category, cluster, element);
                vacant.insert(address);
                return Ok(address);
            }
        }

        // All 254 slots taken.
        let smallest = slots.smallest_used();
        drop(slots);
        let address = self.resolve_overflow(triple, &normalized, smallest)?;
        vacant.insert(address);
        Ok(address)
    }

    fn resolve_overflow(
        &self,
        triple: Triple,
        normalized: &str,
        smallest: Option<u8>,
    ) -> Result<Address> {
        let (domain, category, cluster) = triple;
        let element = match self.policy {
            OverflowPolicy::ReuseSmallest => {
                // smallest is always Some here: the triple has 254 used slots.
                let element = smallest.unwrap_or(0);
                tracing::warn!(
                    "triple 0x{:02X}:{:02X}:{:02X} exhausted, reusing element 0x{:02X} for '{}'",
                    domain,
                    category,
                    cluster,
                    element,
                    normalized
                );
                element
            }
            OverflowPolicy::ReservedSlot => {
                tracing::warn!(
                    "triple 0x{:02X}:{:02X}:{:02X} exhausted, assigning overflow slot to '{}'",
                    domain,
                    category,
                    cluster,
                    normalized
                );
                ELEMENT_OVERFLOW
            }
            OverflowPolicy::Fail => {
                bail!(
                    "address space exhausted for triple 0x{:02X}:{:02X}:{:02X}",
                    domain,
                    category,
                    cluster
                );
            }
        };

        self.overflow_hits.fetch_add(1, Ordering::Relaxed);
        Ok(Address::new(domain, category, cluster, element))
    }

    /// Whether an element slot is free for explicit placement.
    pub fn is_available(&self, domain: u8, category: u8, cluster: u8, element: u8) -> bool {
        if element as usize >= ELEMENT_SLOTS {
            return false;
        }
        match self.slots.get(&(domain, category, cluster)) {
            Some(slots) => !slots.used[element as usize],
            None => true,
        }
    }

    /// Atomic reserve-if-available, used for manual placement (migrations,
    /// pre-assigned concept slots). Returns false if the slot was taken.
    pub fn reserve(&self, address: Address, key: &str) -> bool {
        if address.element as usize >= ELEMENT_SLOTS {
            return false;
        }

        let triple = address.triple();
        let mut slots = self.slots.entry(triple).or_insert_with(SlotSet::new);
        if slots.used[address.element as usize] {
            return false;
        }
        slots.used[address.element as usize] = true;
        slots.allocated += 1;
        drop(slots);

        self.key_cache.insert((triple, normalize_key(key)), address);
        true
    }

    /// Seeds the table from a previously persisted entry so idempotence
    /// survives across runs. Existing occupancy is left untouched.
    pub fn load_entry(&self, address: Address, key: &str) {
        let triple = address.triple();
        if (address.element as usize) < ELEMENT_SLOTS {
            let mut slots = self.slots.entry(triple).or_insert_with(SlotSet::new);
            if !slots.used[address.element as usize] {
                slots.used[address.element as usize] = true;
                slots.allocated += 1;
            }
        }
        self.key_cache.insert((triple, normalize_key(key)), address);
    }

    /// Number of elements allocated in one triple.
    pub fn allocated_in(&self, domain: u8, category: u8, cluster: u8) -> usize {
        self.slots
            .get(&(domain, category, cluster))
            .map(|slots| slots.allocated)
            .unwrap_or(0)
    }

    pub fn statistics(&self) -> AllocatorStats {
        AllocatorStats {
            total_generated: self.total_generated.load(Ordering::Relaxed),
            collisions_resolved: self.collisions_resolved.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            overflow_hits: self.overflow_hits.load(Ordering::Relaxed),
        }
    }
}

/// Lexical keys are compared case-insensitively with surrounding whitespace
/// stripped; this is the normalization the idempotence cache is keyed on.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Deterministic starting slot in `[0, 0xFD]` for a normalized key.
fn hash_start(normalized: &str) -> u8 {
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    (hasher.finish() % ELEMENT_SLOTS as u64) as u8
}
