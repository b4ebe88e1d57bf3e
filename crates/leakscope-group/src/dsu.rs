//! Union-find over allocation identities.
//!
//! Union by size plus path compression on [`find`](DisjointSets::find)
//! keeps the amortized cost of every operation at O(α(n)).
//! [`root_of`](DisjointSets::root_of) is the non-compressing variant for
//! callers holding only `&self`; union by size alone bounds it at
//! O(log n).

use std::collections::HashMap;

use ahash::RandomState;
use indexmap::IndexMap;

use leakscope_core::{AllocId, TrackerError};

/// Representative → members, as returned by [`DisjointSets::groups`].
///
/// Groups appear in the order their first member was inserted; members
/// appear in insertion order.
pub type Groups = IndexMap<AllocId, Vec<AllocId>, RandomState>;

/// Disjoint-set forest keyed by [`AllocId`].
///
/// Identities are dense-indexed on insertion; the forest itself is three
/// parallel vectors.
#[derive(Clone, Debug, Default)]
pub struct DisjointSets {
    index: HashMap<AllocId, usize, RandomState>,
    ids: Vec<AllocId>,
    parent: Vec<usize>,
    /// Member count, meaningful only at roots.
    size: Vec<u32>,
    set_count: usize,
}

impl DisjointSets {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty forest with room for `capacity` identities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            ids: Vec::with_capacity(capacity),
            parent: Vec::with_capacity(capacity),
            size: Vec::with_capacity(capacity),
            set_count: 0,
        }
    }

    /// Add `id` as a singleton set. Returns `false` if it was already present.
    pub fn insert(&mut self, id: AllocId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        let idx = self.ids.len();
        self.index.insert(id, idx);
        self.ids.push(id);
        self.parent.push(idx);
        self.size.push(1);
        self.set_count += 1;
        true
    }

    /// Whether `id` has been inserted.
    pub fn contains(&self, id: AllocId) -> bool {
        self.index.contains_key(&id)
    }

    /// Representative of the set containing `id`, compressing the path.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if `id` was never inserted.
    pub fn find(&mut self, id: AllocId) -> Result<AllocId, TrackerError> {
        let idx = self.index_of(id)?;
        let root = self.find_index(idx);
        Ok(self.ids[root])
    }

    /// Representative of the set containing `id`, without mutating the
    /// forest.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if `id` was never inserted.
    pub fn root_of(&self, id: AllocId) -> Result<AllocId, TrackerError> {
        let idx = self.index_of(id)?;
        Ok(self.ids[self.root_index(idx)])
    }

    /// Merge the sets containing `a` and `b`. Returns the representative
    /// of the merged set.
    ///
    /// The larger set's root becomes the representative; on a tie, `a`'s
    /// root wins. Merging two members of the same set changes nothing.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if either identity was never
    /// inserted. The forest is unchanged in that case.
    pub fn union(&mut self, a: AllocId, b: AllocId) -> Result<AllocId, TrackerError> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        let ra = self.find_index(ia);
        let rb = self.find_index(ib);
        if ra == rb {
            return Ok(self.ids[ra]);
        }
        let (root, child) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[child] = root;
        self.size[root] += self.size[child];
        self.set_count -= 1;
        Ok(self.ids[root])
    }

    /// Whether `a` and `b` are in the same set.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if either identity was never
    /// inserted.
    pub fn same_set(&mut self, a: AllocId, b: AllocId) -> Result<bool, TrackerError> {
        Ok(self.find(a)? == self.find(b)?)
    }

    /// Number of members in the set containing `id`.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if `id` was never inserted.
    pub fn set_size(&self, id: AllocId) -> Result<usize, TrackerError> {
        let idx = self.index_of(id)?;
        Ok(self.size[self.root_index(idx)] as usize)
    }

    /// Number of disjoint sets.
    pub fn set_count(&self) -> usize {
        self.set_count
    }

    /// Number of identities in the forest.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the forest is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Materialize the current partition. O(n) snapshot.
    pub fn groups(&self) -> Groups {
        const UNRESOLVED: usize = usize::MAX;
        let mut roots = vec![UNRESOLVED; self.parent.len()];
        let mut walked = Vec::new();
        let mut groups = Groups::with_capacity_and_hasher(self.set_count, RandomState::new());
        for (idx, &id) in self.ids.iter().enumerate() {
            // Climb until a root or an already resolved node, then record
            // the answer for every node on the way so no edge is climbed twice.
            let mut cur = idx;
            while roots[cur] == UNRESOLVED && self.parent[cur] != cur {
                walked.push(cur);
                cur = self.parent[cur];
            }
            let root = if roots[cur] == UNRESOLVED { cur } else { roots[cur] };
            roots[cur] = root;
            for node in walked.drain(..) {
                roots[node] = root;
            }
            groups.entry(self.ids[root]).or_default().push(id);
        }
        groups
    }

    /// Drop every identity for which `keep` returns `false`, preserving
    /// the partition of the remaining identities.
    ///
    /// Representatives may change when the old representative is dropped.
    /// Returns the number of identities removed. O(n).
    pub fn retain(&mut self, mut keep: impl FnMut(AllocId) -> bool) -> usize {
        let before = self.ids.len();
        let mut rebuilt = Self::with_capacity(before);
        // Old root index → first kept member of that set.
        let mut anchors: HashMap<usize, AllocId, RandomState> = HashMap::default();
        for idx in 0..before {
            let id = self.ids[idx];
            if !keep(id) {
                continue;
            }
            let root = self.root_index(idx);
            rebuilt.insert(id);
            match anchors.get(&root) {
                Some(&anchor) => {
                    // Both were inserted just above or earlier in this loop.
                    let _ = rebuilt.union(anchor, id);
                }
                None => {
                    anchors.insert(root, id);
                }
            }
        }
        let removed = before - rebuilt.len();
        *self = rebuilt;
        removed
    }

    fn index_of(&self, id: AllocId) -> Result<usize, TrackerError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(TrackerError::UnknownIdentity { id })
    }

    fn root_index(&self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            idx = self.parent[idx];
        }
        idx
    }

    fn find_index(&mut self, idx: usize) -> usize {
        let root = self.root_index(idx);
        let mut cur = idx;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }
}
