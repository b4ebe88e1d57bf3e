//! End-to-end tracker scenarios driven through the public event surface.

use std::collections::BTreeSet;

use leakscope_core::{AllocId, LifeState, Operation, TrackerError};
use leakscope_graph::Strategy;
use leakscope_test_utils::fixtures::{self, A, B, C};
use leakscope_test_utils::{random_graph, GraphSpec};
use leakscope_tracker::{Tracker, TrackerConfig};
use proptest::prelude::*;

fn load(spec: &GraphSpec) -> Tracker {
    let mut tracker = Tracker::new(TrackerConfig {
        initial_capacity: spec.nodes.len(),
        ..TrackerConfig::default()
    })
    .unwrap();
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
    tracker
}

fn set(ids: &[AllocId]) -> BTreeSet<AllocId> {
    ids.iter().copied().collect()
}

#[test]
fn abc_end_to_end() {
    let mut tracker = load(&fixtures::abc());

    // Groups follow provenance: {A, B} and {C}.
    assert_eq!(tracker.group_count(), 2);
    assert_eq!(tracker.find(A).unwrap(), tracker.find(B).unwrap());
    assert_ne!(tracker.find(A).unwrap(), tracker.find(C).unwrap());
    let groups = tracker.groups();
    let mut members: Vec<BTreeSet<AllocId>> = groups
        .values()
        .map(|m| m.iter().copied().collect())
        .collect();
    members.sort();
    assert_eq!(members, vec![set(&[A, B]), set(&[C])]);

    assert_eq!(tracker.leaks([A]).unwrap(), set(&[C]));
    assert_eq!(
        tracker.leaks_with([A], Strategy::BreadthFirst).unwrap(),
        set(&[C])
    );

    tracker.on_free(C).unwrap();
    assert!(tracker.leaks([A]).unwrap().is_empty());

    assert_eq!(tracker.compact(), 1);
    assert!(tracker.lookup(C).is_none());
    assert_eq!(tracker.state(C), LifeState::Purged);
    assert_eq!(tracker.group_count(), 1);

    let stats = tracker.stats();
    assert_eq!(stats.live_count, 2);
    assert_eq!(stats.freed_count, 0);
    assert_eq!(stats.live_bytes, 30);
    assert_eq!(stats.edge_count, 1);
    assert_eq!(stats.total_registered, 3);
}

#[test]
fn empty_roots_leak_every_live_record() {
    let mut tracker = load(&fixtures::abc());
    tracker.on_free(B).unwrap();
    assert_eq!(tracker.leaks([]).unwrap(), set(&[A, C]));
}

#[test]
fn unknown_root_is_rejected() {
    let tracker = load(&fixtures::abc());
    assert_eq!(
        tracker.leaks([AllocId(0xFFFF)]).unwrap_err(),
        TrackerError::UnknownIdentity {
            id: AllocId(0xFFFF)
        }
    );
}

#[test]
fn freed_root_still_reaches_its_targets() {
    let mut tracker = load(&fixtures::abc());
    tracker.on_free(A).unwrap();
    assert_eq!(tracker.leaks([A]).unwrap(), set(&[C]));
}

#[test]
fn second_free_then_compact() {
    let mut tracker = load(&fixtures::abc());
    tracker.on_free(B).unwrap();
    assert_eq!(
        tracker.on_free(B).unwrap_err(),
        TrackerError::InvalidState {
            id: B,
            state: LifeState::Freed,
            operation: Operation::Free,
        }
    );
    tracker.compact();
    assert!(tracker.lookup(B).is_none());
    assert_eq!(tracker.neighbors(A).count(), 0);
}

#[test]
fn edge_changes_are_idempotent() {
    let mut tracker = load(&fixtures::abc());
    assert!(!tracker.on_ref_add(A, B).unwrap());
    assert_eq!(tracker.stats().edge_count, 1);
    assert!(!tracker.on_ref_remove(B, C));
    assert!(tracker.on_ref_remove(A, B));
    assert!(!tracker.on_ref_remove(A, B));
    assert_eq!(tracker.stats().edge_count, 0);
    assert_eq!(tracker.leaks([A]).unwrap(), set(&[B, C]));
}

#[test]
fn edge_to_unknown_identity_is_rejected() {
    let mut tracker = load(&fixtures::abc());
    assert_eq!(
        tracker.on_ref_add(A, AllocId(99)).unwrap_err(),
        TrackerError::UnknownIdentity { id: AllocId(99) }
    );
    assert_eq!(tracker.stats().edge_count, 1);
}

#[test]
fn zombie_references_are_reported_not_errors() {
    let spec = fixtures::ring_with_tail();
    let mut tracker = load(&spec);
    tracker.on_free(AllocId(4)).unwrap();
    let report = tracker.report([AllocId(1)]).unwrap();
    assert_eq!(report.leaks, set(&[AllocId(5), AllocId(6)]));
    assert_eq!(report.leaked_bytes, 128);
    assert_eq!(report.zombies.len(), 1);
    assert_eq!(report.zombies[0].from, AllocId(3));
    assert_eq!(report.zombies[0].to, AllocId(4));
    assert!(report.zombies[0].holder_reachable);
}

#[test]
fn snapshot_is_in_registration_order() {
    let tracker = load(&fixtures::abc());
    let ids: Vec<AllocId> = tracker.snapshot().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![A, B, C]);
}

#[test]
fn handle_detects_reuse_after_purge() {
    let mut tracker = Tracker::default();
    let first = tracker.on_alloc(AllocId(1), 8, "a").unwrap();
    tracker.on_free(AllocId(1)).unwrap();
    tracker.compact();
    let second = tracker.on_alloc(AllocId(1), 16, "a").unwrap();
    assert!(tracker.resolve(first).is_none());
    assert_eq!(tracker.resolve(second).unwrap().size_bytes, 16);
}

#[test]
fn compaction_on_random_graph_keeps_model_consistent() {
    let spec = random_graph(7, 500, 900, 0.3);
    let mut tracker = load(&spec);
    let purged = tracker.compact();
    assert_eq!(purged, spec.freed.len());
    for id in &spec.freed {
        assert_eq!(tracker.state(*id), LifeState::Purged);
        assert!(tracker.group_of(*id).is_err());
    }
    for (from, to) in tracker.graph().edges() {
        assert!(tracker.lookup(from).is_some());
        assert!(tracker.lookup(to).is_some());
    }
    let stats = tracker.stats();
    assert_eq!(stats.live_count, 500 - spec.freed.len());
    let grouped: usize = tracker.groups().values().map(Vec::len).sum();
    assert_eq!(grouped, stats.live_count);
}

proptest! {
    #[test]
    fn groups_match_provenance_after_compaction(
        seed in any::<u64>(),
        nodes in 1usize..80,
        free_ratio in 0.0f64..0.9,
    ) {
        let spec = random_graph(seed, nodes, nodes, free_ratio);
        let mut tracker = load(&spec);
        tracker.compact();
        let records = tracker.snapshot();
        for a in &records {
            for b in &records {
                let same_group = tracker.group_of(a.id).unwrap() == tracker.group_of(b.id).unwrap();
                prop_assert_eq!(same_group, a.provenance == b.provenance);
            }
        }
    }

    #[test]
    fn leaks_never_include_freed_records(
        seed in any::<u64>(),
        nodes in 1usize..60,
        edges in 0usize..120,
    ) {
        let spec = random_graph(seed, nodes, edges, 0.3);
        let tracker = load(&spec);
        let roots = spec.pick_roots(seed, 3);
        let leaks = tracker.leaks(roots.iter().copied()).unwrap();
        for id in leaks {
            prop_assert_eq!(tracker.state(id), LifeState::Live);
        }
    }
}
