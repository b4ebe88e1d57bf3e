//! Criterion micro-benchmarks for reachability scans and grouping.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use leakscope_core::AllocId;
use leakscope_graph::{Analyzer, Strategy};
use leakscope_group::DisjointSets;
use leakscope_test_utils::{fixtures, random_graph};

/// Benchmark: DFS vs BFS leak scan over a 10K-node random graph.
fn bench_find_leaks_10k(c: &mut Criterion) {
    let spec = random_graph(42, 10_000, 20_000, 0.1);
    let (registry, graph) = spec.build();
    let roots = spec.pick_roots(1, 16);
    let analyzer = Analyzer::new(&graph, &registry);

    let mut group = c.benchmark_group("find_leaks_10k");
    for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{strategy:?}")),
            &strategy,
            |b, &strategy| {
                b.iter(|| {
                    let leaks = analyzer.find_leaks(roots.iter().copied(), strategy).unwrap();
                    black_box(leaks.len());
                });
            },
        );
    }
    group.finish();
}

/// Benchmark: depth-first walk down a 100K-long chain.
fn bench_deep_chain(c: &mut Criterion) {
    let spec = fixtures::chain(100_000);
    let (registry, graph) = spec.build();
    let analyzer = Analyzer::new(&graph, &registry);
    c.bench_function("depth_first_chain_100k", |b| {
        b.iter(|| {
            let reached = analyzer.depth_first([AllocId(0)]).unwrap();
            black_box(reached.len());
        });
    });
}

/// Benchmark: 100K unions followed by a full group snapshot.
fn bench_union_find_100k(c: &mut Criterion) {
    c.bench_function("union_find_100k", |b| {
        b.iter(|| {
            let mut sets = DisjointSets::with_capacity(100_000);
            for i in 0..100_000u64 {
                sets.insert(AllocId(i));
            }
            for i in 1..100_000u64 {
                sets.union(AllocId(i % 64), AllocId(i)).unwrap();
            }
            black_box(sets.groups().len());
        });
    });
}

criterion_group!(
    benches,
    bench_find_leaks_10k,
    bench_deep_chain,
    bench_union_find_100k
);
criterion_main!(benches);
