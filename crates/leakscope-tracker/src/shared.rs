//! Thread-shared tracker handle.
//!
//! [`SharedTracker`] is an `Arc<RwLock<Tracker>>` with one lock
//! acquisition per logical operation. Queries that only read (leak scans,
//! group snapshots, stats) share the read lock. Every mutation takes the
//! write lock, including the path-compressing [`find`](SharedTracker::find);
//! [`group_of`](SharedTracker::group_of) is the read-lock alternative.
//!
//! For multi-step sequences that must not interleave with other threads,
//! hold a guard from [`read()`](SharedTracker::read) or
//! [`write()`](SharedTracker::write) across the steps.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use leakscope_core::{AllocId, LifeState, ProvenanceKey, Record, RecordHandle, TrackerError};
use leakscope_graph::LeakReport;
use leakscope_group::Groups;

use crate::config::{ConfigError, TrackerConfig};
use crate::events::{DrainReport, EventQueue};
use crate::metrics::{FrameStats, Stats, TrackerMetrics};
use crate::tracker::Tracker;

/// Cloneable, thread-safe handle to one [`Tracker`].
#[derive(Clone, Debug, Default)]
pub struct SharedTracker {
    inner: Arc<RwLock<Tracker>>,
}

impl SharedTracker {
    /// Build a shared tracker from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config.validate()` fails.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Self::from(Tracker::new(config)?))
    }

    /// Shared read access for the guard's lifetime.
    pub fn read(&self) -> RwLockReadGuard<'_, Tracker> {
        self.inner.read()
    }

    /// Exclusive access for the guard's lifetime.
    pub fn write(&self) -> RwLockWriteGuard<'_, Tracker> {
        self.inner.write()
    }

    /// See [`Tracker::on_alloc`].
    pub fn on_alloc(
        &self,
        id: AllocId,
        size_bytes: u64,
        provenance: impl Into<ProvenanceKey>,
    ) -> Result<RecordHandle, TrackerError> {
        self.inner.write().on_alloc(id, size_bytes, provenance)
    }

    /// See [`Tracker::track`].
    pub fn track(
        &self,
        size_bytes: u64,
        provenance: impl Into<ProvenanceKey>,
    ) -> Result<AllocId, TrackerError> {
        self.inner.write().track(size_bytes, provenance)
    }

    /// See [`Tracker::on_free`].
    pub fn on_free(&self, id: AllocId) -> Result<(), TrackerError> {
        self.inner.write().on_free(id)
    }

    /// See [`Tracker::on_ref_add`].
    pub fn on_ref_add(&self, from: AllocId, to: AllocId) -> Result<bool, TrackerError> {
        self.inner.write().on_ref_add(from, to)
    }

    /// See [`Tracker::on_ref_remove`].
    pub fn on_ref_remove(&self, from: AllocId, to: AllocId) -> bool {
        self.inner.write().on_ref_remove(from, to)
    }

    /// See [`Tracker::drain`].
    pub fn drain(&self, queue: &EventQueue) -> DrainReport {
        self.inner.write().drain(queue)
    }

    /// See [`Tracker::lookup`]. Returns an owned copy.
    pub fn lookup(&self, id: AllocId) -> Option<Record> {
        self.inner.read().lookup(id).cloned()
    }

    /// See [`Tracker::state`].
    pub fn state(&self, id: AllocId) -> LifeState {
        self.inner.read().state(id)
    }

    /// See [`Tracker::leaks`].
    pub fn leaks(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
    ) -> Result<BTreeSet<AllocId>, TrackerError> {
        self.inner.read().leaks(roots)
    }

    /// See [`Tracker::report`].
    pub fn report(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
    ) -> Result<LeakReport, TrackerError> {
        self.inner.read().report(roots)
    }

    /// See [`Tracker::find`]. Takes the write lock.
    pub fn find(&self, id: AllocId) -> Result<AllocId, TrackerError> {
        self.inner.write().find(id)
    }

    /// See [`Tracker::group_of`].
    pub fn group_of(&self, id: AllocId) -> Result<AllocId, TrackerError> {
        self.inner.read().group_of(id)
    }

    /// See [`Tracker::union`].
    pub fn union(&self, a: AllocId, b: AllocId) -> Result<AllocId, TrackerError> {
        self.inner.write().union(a, b)
    }

    /// See [`Tracker::groups`].
    pub fn groups(&self) -> Groups {
        self.inner.read().groups()
    }

    /// See [`Tracker::snapshot`].
    pub fn snapshot(&self) -> Vec<Record> {
        self.inner.read().snapshot()
    }

    /// See [`Tracker::stats`].
    pub fn stats(&self) -> Stats {
        self.inner.read().stats()
    }

    /// See [`Tracker::compact`].
    pub fn compact(&self) -> usize {
        self.inner.write().compact()
    }

    /// See [`Tracker::next_frame`].
    pub fn next_frame(&self) -> FrameStats {
        self.inner.write().next_frame()
    }

    /// See [`Tracker::metrics`].
    pub fn metrics(&self) -> TrackerMetrics {
        self.inner.read().metrics()
    }
}

impl From<Tracker> for SharedTracker {
    fn from(tracker: Tracker) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tracker)),
        }
    }
}
