//! Benchmark profiles for the leakscope allocation tracker.
//!
//! - [`address_ids`]: aligned, address-like identities, the
//!   collision-prone distribution the registry hash must absorb
//! - [`scene_profile`]: a populated tracker shaped like a game scene
//!   (one root, a tree of owned objects, a fraction of orphans)
//! - [`random_profile`]: a tracker replayed from a seeded random graph

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use leakscope_core::AllocId;
use leakscope_test_utils::{random_graph, PROVENANCE_POOL};
use leakscope_tracker::{Tracker, TrackerConfig};

/// Base of the identities produced by [`address_ids`].
pub const HEAP_BASE: u64 = 0x7f3a_0000_0000;

/// `count` identities spaced 64 bytes apart starting at [`HEAP_BASE`].
pub fn address_ids(count: usize) -> Vec<AllocId> {
    (0..count as u64).map(|i| AllocId(HEAP_BASE + i * 64)).collect()
}

fn presized(records: usize) -> Tracker {
    let config = TrackerConfig {
        initial_capacity: records,
        ..TrackerConfig::default()
    };
    Tracker::new(config).unwrap()
}

/// A tracker holding `records` allocations: a root, a fan-out-of-4 tree
/// under it, and every tenth node detached from its parent.
///
/// Returns the tracker and the root identity.
pub fn scene_profile(records: usize) -> (Tracker, AllocId) {
    let ids = address_ids(records.max(1));
    let mut tracker = presized(ids.len());
    for (i, &id) in ids.iter().enumerate() {
        let provenance = PROVENANCE_POOL[i % PROVENANCE_POOL.len()];
        tracker.on_alloc(id, 32 + (i as u64 % 8) * 16, provenance).unwrap();
    }
    for i in 1..ids.len() {
        if i % 10 != 0 {
            tracker.on_ref_add(ids[(i - 1) / 4], ids[i]).unwrap();
        }
    }
    (tracker, ids[0])
}

/// A tracker replayed from [`random_graph`] with `records` nodes and twice
/// as many edges. Returns the tracker and the first node as root.
pub fn random_profile(seed: u64, records: usize) -> (Tracker, AllocId) {
    let spec = random_graph(seed, records.max(1), records * 2, 0.1);
    let mut tracker = presized(spec.nodes.len());
    for node in &spec.nodes {
        tracker
            .on_alloc(node.id, node.size_bytes, node.provenance.clone())
            .unwrap();
    }
    for &(from, to) in &spec.edges {
        tracker.on_ref_add(from, to).unwrap();
    }
    for &id in &spec.freed {
        tracker.on_free(id).unwrap();
    }
    (tracker, spec.nodes[0].id)
}
