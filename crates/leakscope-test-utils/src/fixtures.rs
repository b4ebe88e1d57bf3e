//! Hand-written graph fixtures.
//!
//! - [`abc`]: A(10,"f") → B(20,"f"), C(5,"g") isolated.
//! - [`chain`]: a single path `0 → 1 → … → n-1`.
//! - [`ring_with_tail`]: a cycle with one node hanging off it and an
//!   unreachable two-node island.

use leakscope_core::{AllocId, ProvenanceKey};

use crate::{GraphSpec, NodeSpec};

pub const A: AllocId = AllocId(0xA);
pub const B: AllocId = AllocId(0xB);
pub const C: AllocId = AllocId(0xC);

fn node(id: AllocId, size_bytes: u64, provenance: &str) -> NodeSpec {
    NodeSpec {
        id,
        size_bytes,
        provenance: ProvenanceKey::from(provenance),
    }
}

/// Three records, one edge: the smallest graph with a leak.
pub fn abc() -> GraphSpec {
    GraphSpec {
        nodes: vec![node(A, 10, "f"), node(B, 20, "f"), node(C, 5, "g")],
        edges: vec![(A, B)],
        freed: Vec::new(),
    }
}

/// A path of `len` nodes with ids `0..len`.
pub fn chain(len: u64) -> GraphSpec {
    GraphSpec {
        nodes: (0..len).map(|i| node(AllocId(i), 8, "chain")).collect(),
        edges: (1..len).map(|i| (AllocId(i - 1), AllocId(i))).collect(),
        freed: Vec::new(),
    }
}

/// Ring `1 → 2 → 3 → 1`, tail `3 → 4`, island `5 ⇄ 6`.
///
/// Rooted at 1, the leaks are exactly {5, 6}.
pub fn ring_with_tail() -> GraphSpec {
    let id = AllocId;
    GraphSpec {
        nodes: vec![
            node(id(1), 16, "ring"),
            node(id(2), 16, "ring"),
            node(id(3), 16, "ring"),
            node(id(4), 32, "tail"),
            node(id(5), 64, "island"),
            node(id(6), 64, "island"),
        ],
        edges: vec![
            (id(1), id(2)),
            (id(2), id(3)),
            (id(3), id(1)),
            (id(3), id(4)),
            (id(5), id(6)),
            (id(6), id(5)),
        ],
        freed: Vec::new(),
    }
}
