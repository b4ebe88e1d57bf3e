//! The [`Registry`] record store.

use ahash::RandomState;
use indexmap::IndexMap;

use leakscope_core::{
    AllocId, LifeState, Operation, ProvenanceKey, Record, RecordHandle, RecordLookup, Timestamp,
    TrackerError,
};

/// Hash-table store of allocation records.
///
/// Each identity maps to at most one record. A record is created live by
/// [`register`](Registry::register), flipped to freed by
/// [`mark_freed`](Registry::mark_freed), and removed only by
/// [`compact`](Registry::compact). Only after compaction may the identity
/// be registered again.
///
/// Aggregate counters (live/freed counts and bytes) are maintained
/// incrementally, so statistics queries are O(1).
#[derive(Clone, Debug)]
pub struct Registry {
    /// Identity → record, in registration order.
    records: IndexMap<AllocId, Record, RandomState>,
    /// Sequence number for the next registration.
    next_seq: u64,
    live_count: usize,
    live_bytes: u64,
    freed_count: usize,
    freed_bytes: u64,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty registry with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: IndexMap::with_capacity_and_hasher(capacity, RandomState::new()),
            next_seq: 0,
            live_count: 0,
            live_bytes: 0,
            freed_count: 0,
            freed_bytes: 0,
        }
    }

    /// Record a new live allocation.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::DuplicateIdentity`] if `id` is held by a live record.
    /// - [`TrackerError::InvalidState`] if `id` is held by a freed record
    ///   that has not been compacted yet.
    pub fn register(
        &mut self,
        id: AllocId,
        size_bytes: u64,
        provenance: ProvenanceKey,
        timestamp: Timestamp,
    ) -> Result<RecordHandle, TrackerError> {
        if let Some(existing) = self.records.get(&id) {
            return Err(if existing.alive {
                TrackerError::DuplicateIdentity { id }
            } else {
                TrackerError::InvalidState {
                    id,
                    state: LifeState::Freed,
                    operation: Operation::Register,
                }
            });
        }

        let record = Record {
            id,
            size_bytes,
            provenance,
            timestamp,
            seq: self.next_seq,
            alive: true,
        };
        let handle = record.handle();
        self.next_seq += 1;
        self.live_count += 1;
        self.live_bytes = self.live_bytes.saturating_add(size_bytes);
        self.records.insert(id, record);
        Ok(handle)
    }

    /// The record for `id`, live or freed. `None` if never registered or
    /// already compacted.
    pub fn lookup(&self, id: AllocId) -> Option<&Record> {
        self.records.get(&id)
    }

    /// The record a handle was issued for.
    ///
    /// Returns `None` if that record was compacted, including when the
    /// identity has since been registered again.
    pub fn resolve(&self, handle: RecordHandle) -> Option<&Record> {
        self.records
            .get(&handle.id())
            .filter(|r| r.seq == handle.seq())
    }

    /// Whether a record (live or freed) is held for `id`.
    pub fn contains(&self, id: AllocId) -> bool {
        self.records.contains_key(&id)
    }

    /// Flip a live record to freed.
    ///
    /// Edges touching the record are not affected; the reference graph
    /// keeps them so references to freed records stay observable.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::UnknownIdentity`] if no record is held for `id`.
    /// - [`TrackerError::InvalidState`] if the record is already freed.
    pub fn mark_freed(&mut self, id: AllocId) -> Result<&Record, TrackerError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(TrackerError::UnknownIdentity { id })?;
        if !record.alive {
            return Err(TrackerError::InvalidState {
                id,
                state: LifeState::Freed,
                operation: Operation::Free,
            });
        }
        record.alive = false;
        self.live_count -= 1;
        self.live_bytes = self.live_bytes.saturating_sub(record.size_bytes);
        self.freed_count += 1;
        self.freed_bytes = self.freed_bytes.saturating_add(record.size_bytes);
        Ok(record)
    }

    /// Remove every freed record and return their identities, in
    /// registration order.
    ///
    /// The caller is responsible for dropping the purged identities from
    /// any structure that refers to them (edges, groups).
    pub fn compact(&mut self) -> Vec<AllocId> {
        if self.freed_count == 0 {
            return Vec::new();
        }
        let mut purged = Vec::with_capacity(self.freed_count);
        self.records.retain(|id, record| {
            if record.alive {
                true
            } else {
                purged.push(*id);
                false
            }
        });
        debug_assert_eq!(purged.len(), self.freed_count);
        self.freed_count = 0;
        self.freed_bytes = 0;
        purged
    }

    /// Iterate over all records (live and freed) in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Iterate over live records in registration order.
    pub fn iter_live(&self) -> impl Iterator<Item = &Record> {
        self.records.values().filter(|r| r.alive)
    }

    /// Iterate over freed (not yet compacted) records in registration order.
    pub fn iter_freed(&self) -> impl Iterator<Item = &Record> {
        self.records.values().filter(|r| !r.alive)
    }

    /// Total records held (live + freed).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of live records.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Number of freed records awaiting compaction.
    pub fn freed_count(&self) -> usize {
        self.freed_count
    }

    /// Sum of `size_bytes` over live records.
    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }

    /// Sum of `size_bytes` over freed records awaiting compaction.
    pub fn freed_bytes(&self) -> u64 {
        self.freed_bytes
    }

    /// Number of registrations ever accepted, including compacted ones.
    pub fn total_registered(&self) -> u64 {
        self.next_seq
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLookup for Registry {
    fn record(&self, id: AllocId) -> Option<&Record> {
        self.lookup(id)
    }

    fn contains(&self, id: AllocId) -> bool {
        self.records.contains_key(&id)
    }

    fn live_records(&self) -> impl Iterator<Item = &Record> {
        self.iter_live()
    }
}
