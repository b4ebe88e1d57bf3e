//! Test utilities and graph fixtures for leakscope development.
//!
//! [`GraphSpec`] is a plain-data description of records, edges, and frees
//! that tests can replay into a registry/graph pair (via
//! [`GraphSpec::build`]) or into a tracker's event surface. Specs are
//! either generated from a seed ([`random_graph`]) or hand-written
//! ([`fixtures`]).
//!
//! [`reference_reach`] is a deliberately naive fixpoint reachability
//! oracle used to cross-check the analyzer.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::BTreeSet;

use leakscope_core::{AllocId, ProvenanceKey, Timestamp};
use leakscope_graph::RefGraph;
use leakscope_registry::Registry;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Provenance labels used by generated graphs.
pub const PROVENANCE_POOL: [&str; 4] = ["spawn_enemy", "spawn_particle", "load_level", "ui_text"];

/// One record in a [`GraphSpec`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSpec {
    pub id: AllocId,
    pub size_bytes: u64,
    pub provenance: ProvenanceKey,
}

/// Records, edges, and frees to replay in order: register every node,
/// add every edge, then free the listed identities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<(AllocId, AllocId)>,
    pub freed: Vec<AllocId>,
}

impl GraphSpec {
    /// Replay into a fresh registry and graph.
    ///
    /// # Panics
    ///
    /// Panics if the description is inconsistent (duplicate node ids, edges to
    /// undeclared nodes, double frees).
    pub fn build(&self) -> (Registry, RefGraph) {
        let mut registry = Registry::with_capacity(self.nodes.len());
        for (t, node) in self.nodes.iter().enumerate() {
            registry
                .register(node.id, node.size_bytes, node.provenance.clone(), Timestamp(t as u64))
                .expect("GraphSpec node ids must be unique");
        }
        let mut graph = RefGraph::with_capacity(self.nodes.len());
        for &(from, to) in &self.edges {
            graph
                .add_edge(&registry, from, to)
                .expect("GraphSpec edges must reference declared nodes");
        }
        for &id in &self.freed {
            registry
                .mark_freed(id)
                .expect("GraphSpec frees must be unique");
        }
        (registry, graph)
    }

    /// All node ids in declaration order.
    pub fn ids(&self) -> Vec<AllocId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Pick up to `count` distinct root ids deterministically from `seed`.
    pub fn pick_roots(&self, seed: u64, count: usize) -> Vec<AllocId> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut roots = BTreeSet::new();
        if self.nodes.is_empty() {
            return Vec::new();
        }
        for _ in 0..count {
            let i = rng.random_range(0..self.nodes.len());
            roots.insert(self.nodes[i].id);
        }
        roots.into_iter().collect()
    }
}

/// Generate a random graph with `node_count` nodes and up to `edge_count`
/// edges (duplicates collapse), freeing roughly `free_ratio` of the nodes.
///
/// Node ids are spaced 16 apart to resemble aligned addresses. Output is
/// fully determined by `seed`.
pub fn random_graph(seed: u64, node_count: usize, edge_count: usize, free_ratio: f64) -> GraphSpec {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let nodes: Vec<NodeSpec> = (0..node_count as u64)
        .map(|i| NodeSpec {
            id: AllocId(0x1000 + i * 16),
            size_bytes: rng.random_range(8..4096),
            provenance: ProvenanceKey::from(
                PROVENANCE_POOL[rng.random_range(0..PROVENANCE_POOL.len())],
            ),
        })
        .collect();

    let mut edges = Vec::with_capacity(edge_count);
    if node_count > 0 {
        for _ in 0..edge_count {
            let from = nodes[rng.random_range(0..node_count)].id;
            let to = nodes[rng.random_range(0..node_count)].id;
            edges.push((from, to));
        }
    }

    let freed = nodes
        .iter()
        .filter(|_| rng.random_bool(free_ratio.clamp(0.0, 1.0)))
        .map(|n| n.id)
        .collect();

    GraphSpec {
        nodes,
        edges,
        freed,
    }
}

/// Fixpoint reachability over an edge list: repeatedly add the targets
/// of every reached source until nothing changes. O(V·E), test-only.
pub fn reference_reach(edges: &[(AllocId, AllocId)], roots: &[AllocId]) -> BTreeSet<AllocId> {
    let mut reached: BTreeSet<AllocId> = roots.iter().copied().collect();
    loop {
        let before = reached.len();
        for &(from, to) in edges {
            if reached.contains(&from) {
                reached.insert(to);
            }
        }
        if reached.len() == before {
            return reached;
        }
    }
}
