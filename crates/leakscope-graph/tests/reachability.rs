//! Integration tests: depth-first and breadth-first walks agree with each
//! other and with a naive fixpoint oracle on generated graphs.

use std::collections::BTreeSet;

use leakscope_core::AllocId;
use leakscope_graph::{Analyzer, Strategy};
use leakscope_test_utils::fixtures;
use leakscope_test_utils::{random_graph, reference_reach};
use proptest::prelude::*;

#[test]
fn ring_with_tail_leaks_only_the_island() {
    let spec = fixtures::ring_with_tail();
    let (registry, graph) = spec.build();
    let analyzer = Analyzer::new(&graph, &registry);
    let expected: BTreeSet<AllocId> = [AllocId(5), AllocId(6)].into_iter().collect();
    for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
        let report = analyzer.report([AllocId(1)], strategy).unwrap();
        assert_eq!(report.leaks, expected);
        assert_eq!(report.leaked_bytes, 128);
        assert_eq!(report.reachable, 4);
    }
}

#[test]
fn chain_distances_increase_by_one() {
    let spec = fixtures::chain(64);
    let (registry, graph) = spec.build();
    let analyzer = Analyzer::new(&graph, &registry);
    let bfs = analyzer.breadth_first([AllocId(0)], None).unwrap();
    for i in 0..64u64 {
        assert_eq!(bfs.distance(AllocId(i)), Some(i as u32));
    }
    let near = analyzer.breadth_first([AllocId(0)], Some(10)).unwrap();
    assert_eq!(near.len(), 11);
}

#[test]
fn large_random_graph_agrees_with_oracle() {
    let spec = random_graph(0xC0FFEE, 2_000, 2_500, 0.1);
    let (registry, graph) = spec.build();
    let roots = spec.pick_roots(1, 20);
    let analyzer = Analyzer::new(&graph, &registry);

    let dfs = analyzer.depth_first(roots.iter().copied()).unwrap().to_set();
    let bfs = analyzer.breadth_first(roots.iter().copied(), None).unwrap().to_set();
    assert_eq!(dfs, bfs);
    assert_eq!(dfs, reference_reach(&spec.edges, &roots));
}

proptest! {
    #[test]
    fn dfs_and_bfs_reach_the_same_set(
        seed in any::<u64>(),
        nodes in 1usize..60,
        edges in 0usize..150,
        root_count in 0usize..5,
    ) {
        let spec = random_graph(seed, nodes, edges, 0.25);
        let (registry, graph) = spec.build();
        let roots = spec.pick_roots(seed ^ 0x5EED, root_count);
        let analyzer = Analyzer::new(&graph, &registry);

        let dfs = analyzer.reach(roots.iter().copied(), Strategy::DepthFirst).unwrap();
        let bfs = analyzer.reach(roots.iter().copied(), Strategy::BreadthFirst).unwrap();
        prop_assert_eq!(dfs.to_set(), bfs.to_set());
        prop_assert_eq!(dfs.to_set(), reference_reach(&spec.edges, &roots));

        let leaks_dfs = analyzer.find_leaks(roots.iter().copied(), Strategy::DepthFirst).unwrap();
        let leaks_bfs = analyzer.find_leaks(roots.iter().copied(), Strategy::BreadthFirst).unwrap();
        prop_assert_eq!(&leaks_dfs, &leaks_bfs);

        // Leaks are exactly the live, unreached records.
        for record in registry.iter() {
            let leaked = leaks_dfs.contains(&record.id);
            prop_assert_eq!(leaked, record.alive && !dfs.contains(record.id));
        }
    }

    #[test]
    fn each_node_visited_once(
        seed in any::<u64>(),
        nodes in 1usize..40,
        edges in 0usize..200,
    ) {
        let spec = random_graph(seed, nodes, edges, 0.0);
        let (registry, graph) = spec.build();
        let analyzer = Analyzer::new(&graph, &registry);
        let all = spec.ids();
        let dfs = analyzer.depth_first(all.iter().copied()).unwrap();
        let bfs = analyzer.breadth_first(all.iter().copied(), None).unwrap();
        prop_assert_eq!(dfs.len(), nodes);
        prop_assert_eq!(bfs.iter().count(), nodes);
    }
}
