//! The [`RefGraph`] adjacency structure.
//!
//! Outgoing edges are kept per node in an insertion-ordered set, so
//! [`neighbors`](RefGraph::neighbors) is deterministic and
//! [`add_edge`](RefGraph::add_edge) is idempotent in O(1). A reverse
//! index of incoming edges lets [`detach`](RefGraph::detach) drop every
//! edge touching a purged record without scanning the whole graph.

use std::collections::HashMap;

use ahash::RandomState;
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use leakscope_core::{AllocId, RecordLookup, TrackerError};

type EdgeSet = IndexSet<AllocId, RandomState>;

/// Directed graph of references between tracked allocations.
///
/// Cycles, self-loops, and disconnected components need no special
/// handling. Edges to freed records are kept until the records are
/// purged; they are what the analyzer reports as zombie references.
#[derive(Clone, Debug, Default)]
pub struct RefGraph {
    /// Source → targets. Targets are in insertion order; sources with no
    /// remaining edges are swap-removed.
    outgoing: IndexMap<AllocId, EdgeSet, RandomState>,
    /// Target → sources. Order is not significant.
    incoming: HashMap<AllocId, SmallVec<[AllocId; 4]>, RandomState>,
    edge_count: usize,
}

impl RefGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph sized for about `nodes` source nodes.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            outgoing: IndexMap::with_capacity_and_hasher(nodes, RandomState::new()),
            incoming: HashMap::with_capacity_and_hasher(nodes, RandomState::new()),
            edge_count: 0,
        }
    }

    /// Record that `from` holds a reference to `to`.
    ///
    /// Returns `true` if the edge is new, `false` if it already existed.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if either endpoint has no record
    /// in `records`. Freed records are valid endpoints.
    pub fn add_edge(
        &mut self,
        records: &impl RecordLookup,
        from: AllocId,
        to: AllocId,
    ) -> Result<bool, TrackerError> {
        for id in [from, to] {
            if !records.contains(id) {
                return Err(TrackerError::UnknownIdentity { id });
            }
        }
        let inserted = self
            .outgoing
            .entry(from)
            .or_insert_with(EdgeSet::default)
            .insert(to);
        if inserted {
            self.incoming.entry(to).or_default().push(from);
            self.edge_count += 1;
        }
        Ok(inserted)
    }

    /// Remove the edge `from → to`.
    ///
    /// Returns `true` if an edge was removed. Removing an edge that does
    /// not exist is a no-op.
    pub fn remove_edge(&mut self, from: AllocId, to: AllocId) -> bool {
        let Some(targets) = self.outgoing.get_mut(&from) else {
            return false;
        };
        if !targets.shift_remove(&to) {
            return false;
        }
        if targets.is_empty() {
            self.outgoing.swap_remove(&from);
        }
        self.unlink_incoming(to, from);
        self.edge_count -= 1;
        true
    }

    /// Outgoing edges of `id` in insertion order.
    ///
    /// The returned iterator is lazy, finite, and restartable by cloning.
    /// An identity with no outgoing edges, or one the graph has never
    /// seen, yields nothing.
    pub fn neighbors(&self, id: AllocId) -> Neighbors<'_> {
        Neighbors {
            inner: self.outgoing.get(&id).map(|set| set.iter()),
        }
    }

    /// Whether the edge `from → to` exists.
    pub fn contains_edge(&self, from: AllocId, to: AllocId) -> bool {
        self.outgoing
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Number of outgoing edges of `id`.
    pub fn out_degree(&self, id: AllocId) -> usize {
        self.outgoing.get(&id).map_or(0, IndexSet::len)
    }

    /// Number of incoming edges of `id`.
    pub fn in_degree(&self, id: AllocId) -> usize {
        self.incoming.get(&id).map_or(0, SmallVec::len)
    }

    /// Sources holding a reference to `id`. Order is unspecified.
    pub fn referrers(&self, id: AllocId) -> impl Iterator<Item = AllocId> + '_ {
        self.incoming.get(&id).into_iter().flatten().copied()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// All edges, grouped by source.
    ///
    /// Targets appear in insertion order within each source. Source order
    /// is deterministic for a given sequence of operations but is not
    /// insertion order once sources have lost all their edges.
    pub fn edges(&self) -> impl Iterator<Item = (AllocId, AllocId)> + '_ {
        self.outgoing
            .iter()
            .flat_map(|(&from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    /// Remove every edge incident to any of `ids`, in either direction.
    ///
    /// Returns the number of edges removed. Used when records are purged
    /// so no edge outlives its endpoints.
    pub fn detach(&mut self, ids: impl IntoIterator<Item = AllocId>) -> usize {
        let before = self.edge_count;
        for id in ids {
            if let Some(targets) = self.outgoing.swap_remove(&id) {
                for to in &targets {
                    self.unlink_incoming(*to, id);
                }
                self.edge_count -= targets.len();
            }
            if let Some(sources) = self.incoming.remove(&id) {
                for from in sources {
                    let Some(targets) = self.outgoing.get_mut(&from) else {
                        continue;
                    };
                    if targets.shift_remove(&id) {
                        self.edge_count -= 1;
                        if targets.is_empty() {
                            self.outgoing.swap_remove(&from);
                        }
                    }
                }
            }
        }
        before - self.edge_count
    }

    /// Remove all edges.
    pub fn clear(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
        self.edge_count = 0;
    }

    fn unlink_incoming(&mut self, to: AllocId, from: AllocId) {
        if let Some(sources) = self.incoming.get_mut(&to) {
            if let Some(pos) = sources.iter().position(|&s| s == from) {
                sources.swap_remove(pos);
            }
            if sources.is_empty() {
                self.incoming.remove(&to);
            }
        }
    }
}

/// Iterator over a node's outgoing edges, returned by
/// [`RefGraph::neighbors`].
#[derive(Clone, Debug)]
pub struct Neighbors<'g> {
    inner: Option<indexmap::set::Iter<'g, AllocId>>,
}

impl Iterator for Neighbors<'_> {
    type Item = AllocId;

    fn next(&mut self) -> Option<AllocId> {
        self.inner.as_mut()?.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.as_ref().map_or((0, Some(0)), |it| it.size_hint())
    }
}

impl DoubleEndedIterator for Neighbors<'_> {
    fn next_back(&mut self) -> Option<AllocId> {
        self.inner.as_mut()?.next_back().copied()
    }
}

impl ExactSizeIterator for Neighbors<'_> {}
