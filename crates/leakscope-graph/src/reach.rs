//! Reachability analysis over a [`RefGraph`].
//!
//! [`Analyzer`] walks the graph from a caller-supplied root set and
//! classifies every live record as reachable or orphaned. Both walk
//! orders visit each node at most once (O(V+E)) and produce the same
//! reachable set:
//!
//! - [`Strategy::DepthFirst`] follows one path at a time. Its explicit
//!   stack holds only the current path, one lazy neighbor cursor per
//!   level, so wide graphs cost no extra working memory. It records
//!   visited state only.
//! - [`Strategy::BreadthFirst`] expands level by level and records each
//!   node's distance from the nearest root.
//!
//! A path through a freed record still makes its targets reachable. Edges
//! that point at freed records are reported as [`ZombieRef`]s alongside
//! the leaks rather than treated as errors.
//!
//! The analyzer only borrows the graph and the records; every query is
//! read-only.

use std::collections::{BTreeSet, VecDeque};

use ahash::RandomState;
use indexmap::IndexSet;

use leakscope_core::{AllocId, RecordLookup, TrackerError};

use crate::graph::{Neighbors, RefGraph};

/// Walk order used by a reachability query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// Explicit-stack depth-first walk.
    #[default]
    DepthFirst,
    /// Level-order walk with distance tracking.
    BreadthFirst,
}

/// The set of identities reached by one walk.
///
/// Iteration yields identities in visit order. For breadth-first walks
/// each identity also carries its distance (in edges) from the nearest
/// root; roots are at distance 0.
#[derive(Clone, Debug)]
pub struct Reached {
    strategy: Strategy,
    visited: IndexSet<AllocId, RandomState>,
    /// `distances[i]` belongs to `visited[i]`. Empty for depth-first walks.
    distances: Vec<u32>,
}

impl Reached {
    /// Walk order that produced this set.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Whether `id` was reached.
    pub fn contains(&self, id: AllocId) -> bool {
        self.visited.contains(&id)
    }

    /// Distance from the nearest root, for breadth-first walks.
    ///
    /// `None` if `id` was not reached or the walk was depth-first.
    pub fn distance(&self, id: AllocId) -> Option<u32> {
        let idx = self.visited.get_index_of(&id)?;
        self.distances.get(idx).copied()
    }

    /// Number of reached identities.
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    /// Whether nothing was reached.
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Reached identities in visit order.
    pub fn iter(&self) -> impl Iterator<Item = AllocId> + '_ {
        self.visited.iter().copied()
    }

    /// Reached identities as a sorted set.
    pub fn to_set(&self) -> BTreeSet<AllocId> {
        self.visited.iter().copied().collect()
    }
}

/// An edge whose target record has been freed but not yet purged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZombieRef {
    /// Record still holding the reference.
    pub from: AllocId,
    /// Freed record being referenced.
    pub to: AllocId,
    /// Whether `from` is reachable from the roots of the scan.
    pub holder_reachable: bool,
}

/// Result of a full leak scan.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeakReport {
    /// Walk order used.
    pub strategy: Strategy,
    /// Live records with no path from any root, sorted.
    pub leaks: BTreeSet<AllocId>,
    /// Sum of `size_bytes` over `leaks`.
    pub leaked_bytes: u64,
    /// Number of identities reached from the roots, including freed ones.
    pub reachable: usize,
    /// Edges pointing at freed records, in graph edge order.
    pub zombies: Vec<ZombieRef>,
}

impl LeakReport {
    /// Whether the scan found neither leaks nor zombie references.
    pub fn is_clean(&self) -> bool {
        self.leaks.is_empty() && self.zombies.is_empty()
    }
}

/// Read-only reachability queries over a graph and its records.
#[derive(Clone, Copy, Debug)]
pub struct Analyzer<'a, R> {
    graph: &'a RefGraph,
    records: &'a R,
}

impl<'a, R: RecordLookup> Analyzer<'a, R> {
    /// Bind an analyzer to a graph and the records its nodes refer to.
    pub fn new(graph: &'a RefGraph, records: &'a R) -> Self {
        Self { graph, records }
    }

    /// Walk from `roots` with the given strategy.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] for the first root with no record.
    pub fn reach(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        strategy: Strategy,
    ) -> Result<Reached, TrackerError> {
        match strategy {
            Strategy::DepthFirst => self.depth_first(roots),
            Strategy::BreadthFirst => self.breadth_first(roots, None),
        }
    }

    /// Depth-first walk from `roots`.
    ///
    /// Visit order is preorder: a node's first unvisited neighbor and its
    /// whole subtree come before the node's next neighbor. The stack holds
    /// the current path only and recursion depth does not grow with path
    /// length. Neighbors are expanded in insertion order, roots in the
    /// order given.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] for the first root with no record.
    pub fn depth_first(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
    ) -> Result<Reached, TrackerError> {
        let roots = self.checked_roots(roots)?;
        let mut visited: IndexSet<AllocId, RandomState> =
            IndexSet::with_capacity_and_hasher(roots.len(), RandomState::new());
        let mut path: Vec<(AllocId, Neighbors<'_>)> = Vec::new();

        for root in roots {
            if !visited.insert(root) {
                continue;
            }
            path.push((root, self.graph.neighbors(root)));
            while let Some((_, cursor)) = path.last_mut() {
                match cursor.find(|next| !visited.contains(next)) {
                    Some(next) => {
                        visited.insert(next);
                        path.push((next, self.graph.neighbors(next)));
                    }
                    None => {
                        path.pop();
                    }
                }
            }
        }

        Ok(Reached {
            strategy: Strategy::DepthFirst,
            visited,
            distances: Vec::new(),
        })
    }

    /// Breadth-first walk from `roots`, recording distances.
    ///
    /// With `max_depth = Some(d)`, nodes at distance `d` are recorded but
    /// not expanded, so the result holds exactly the nodes within `d`
    /// edges of a root. Leak scans always pass `None`.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] for the first root with no record.
    pub fn breadth_first(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        max_depth: Option<u32>,
    ) -> Result<Reached, TrackerError> {
        let mut visited = self.seed(roots)?;
        let mut distances = vec![0u32; visited.len()];
        let mut queue: VecDeque<(AllocId, u32)> = visited.iter().map(|&id| (id, 0)).collect();

        while let Some((node, dist)) = queue.pop_front() {
            if max_depth.is_some_and(|limit| dist >= limit) {
                continue;
            }
            for next in self.graph.neighbors(node) {
                if visited.insert(next) {
                    distances.push(dist + 1);
                    queue.push_back((next, dist + 1));
                }
            }
        }

        debug_assert_eq!(visited.len(), distances.len());
        Ok(Reached {
            strategy: Strategy::BreadthFirst,
            visited,
            distances,
        })
    }

    /// Live records with no path from any root.
    ///
    /// Freed records are never reported. An empty root set makes every
    /// live record an orphan.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] for the first root with no record.
    pub fn find_leaks(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        strategy: Strategy,
    ) -> Result<BTreeSet<AllocId>, TrackerError> {
        let reached = self.reach(roots, strategy)?;
        Ok(self.orphans(&reached).map(|(id, _)| id).collect())
    }

    /// Leaks and zombie references from one walk.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] for the first root with no record.
    pub fn report(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        strategy: Strategy,
    ) -> Result<LeakReport, TrackerError> {
        let reached = self.reach(roots, strategy)?;
        let mut leaks = BTreeSet::new();
        let mut leaked_bytes = 0u64;
        for (id, size) in self.orphans(&reached) {
            leaks.insert(id);
            leaked_bytes = leaked_bytes.saturating_add(size);
        }
        Ok(LeakReport {
            strategy,
            leaks,
            leaked_bytes,
            reachable: reached.len(),
            zombies: self.zombies(&reached),
        })
    }

    /// Every edge whose target is a freed record.
    ///
    /// `holder_reachable` is computed against `reached`.
    pub fn zombies(&self, reached: &Reached) -> Vec<ZombieRef> {
        self.graph
            .edges()
            .filter(|&(_, to)| self.records.is_alive(to) == Some(false))
            .map(|(from, to)| ZombieRef {
                from,
                to,
                holder_reachable: reached.contains(from),
            })
            .collect()
    }

    /// Validate roots and build the initial visited set.
    fn seed(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
    ) -> Result<IndexSet<AllocId, RandomState>, TrackerError> {
        let roots = self.checked_roots(roots)?;
        let mut visited = IndexSet::with_capacity_and_hasher(roots.len(), RandomState::new());
        visited.extend(roots);
        Ok(visited)
    }

    /// Every root, in order, if all of them have records.
    fn checked_roots(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
    ) -> Result<Vec<AllocId>, TrackerError> {
        roots
            .into_iter()
            .map(|id| {
                if self.records.contains(id) {
                    Ok(id)
                } else {
                    Err(TrackerError::UnknownIdentity { id })
                }
            })
            .collect()
    }

    fn orphans<'r>(&'r self, reached: &'r Reached) -> impl Iterator<Item = (AllocId, u64)> + 'r {
        self.records
            .live_records()
            .filter(|r| !reached.contains(r.id))
            .map(|r| (r.id, r.size_bytes))
    }
}
