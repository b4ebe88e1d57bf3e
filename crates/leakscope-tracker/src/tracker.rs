//! The tracker facade.
//!
//! [`Tracker`] is the single entry point for allocation events and leak
//! queries. It owns the registry, the reference graph, and the grouping
//! engine, and keeps them consistent:
//!
//! - every registration is inserted into the grouping engine and merged
//!   with the first identity seen for the same provenance key;
//! - frees only flip the record's `alive` flag, so edges held by or
//!   pointing at a freed record survive until compaction;
//! - [`compact()`](Tracker::compact) purges freed records, detaches their
//!   edges, and rebuilds the grouping engine without them.
//!
//! # Lifecycle
//!
//! Each identity moves `Unregistered → Live → Freed → Purged`, and back to
//! `Live` only from `Unregistered` or `Purged`. Out-of-order transitions
//! fail with [`TrackerError::InvalidState`] naming the observed state.
//!
//! # Ownership model
//!
//! Mutations take `&mut self` and queries take `&self`, so a plain
//! `Tracker` is single-owner. [`SharedTracker`](crate::SharedTracker)
//! wraps one behind a read-write lock for multi-threaded hosts.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::time::Instant;

use ahash::RandomState;
use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};

use leakscope_core::{
    AllocId, IdAllocator, LifeState, Operation, ProvenanceKey, Record, RecordHandle, TrackerError,
};
use leakscope_graph::{Analyzer, LeakReport, Neighbors, Reached, RefGraph, Strategy};
use leakscope_group::{DisjointSets, Groups};
use leakscope_registry::Registry;

use crate::clock::Clock;
use crate::config::{ConfigError, TrackerConfig};
use crate::events::{DrainReport, EventQueue, TrackerEvent};
use crate::metrics::{FrameStats, ProvenanceTotals, ScanCounters, Stats, TrackerMetrics};

// Fails to compile if any field stops being Send + Sync; SharedTracker
// relies on both.
const _: () = {
    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send_sync::<Tracker>();
    }
};

/// Per-provenance live totals, in first-registration order.
pub type ProvenanceSummary = IndexMap<ProvenanceKey, ProvenanceTotals, RandomState>;

// ── Tracker ─────────────────────────────────────────────────────

/// Allocation tracker: records, references, reachability, and groups.
///
/// # Example
///
/// ```
/// use leakscope_core::AllocId;
/// use leakscope_tracker::{Tracker, TrackerConfig};
///
/// let mut tracker = Tracker::new(TrackerConfig::default())?;
/// let (a, b, c) = (AllocId(1), AllocId(2), AllocId(3));
/// tracker.on_alloc(a, 10, "f")?;
/// tracker.on_alloc(b, 20, "f")?;
/// tracker.on_alloc(c, 5, "g")?;
/// tracker.on_ref_add(a, b)?;
///
/// let leaks = tracker.leaks([a])?;
/// assert_eq!(leaks.into_iter().collect::<Vec<_>>(), vec![c]);
/// assert_eq!(tracker.group_of(a)?, tracker.group_of(b)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Tracker {
    config: TrackerConfig,
    clock: Clock,
    ids: IdAllocator,
    registry: Registry,
    graph: RefGraph,
    groups: DisjointSets,
    /// First registered identity per provenance key still present.
    anchors: HashMap<ProvenanceKey, AllocId, RandomState>,
    purged: HashSet<AllocId, RandomState>,
    frame: u64,
    frame_start_registered: u64,
    frames: VecDeque<FrameStats>,
    metrics: TrackerMetrics,
    scan: ScanCounters,
}

impl Tracker {
    /// Build a tracker from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config.validate()` fails.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: TrackerConfig) -> Self {
        let capacity = config.initial_capacity;
        Self {
            clock: Clock::new(config.clock),
            ids: IdAllocator::new(),
            registry: Registry::with_capacity(capacity),
            graph: RefGraph::with_capacity(capacity),
            groups: DisjointSets::with_capacity(capacity),
            anchors: HashMap::default(),
            purged: HashSet::default(),
            frame: 0,
            frame_start_registered: 0,
            frames: VecDeque::with_capacity(config.frame_history.min(1024)),
            metrics: TrackerMetrics::default(),
            scan: ScanCounters::default(),
            config,
        }
    }

    /// The configuration this tracker was built with.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ── Events ──────────────────────────────────────────────────

    /// Record a new live allocation.
    ///
    /// The identity joins the group of the first identity registered with
    /// the same provenance key.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::DuplicateIdentity`] if `id` is live.
    /// - [`TrackerError::InvalidState`] if `id` is freed but not yet purged.
    pub fn on_alloc(
        &mut self,
        id: AllocId,
        size_bytes: u64,
        provenance: impl Into<ProvenanceKey>,
    ) -> Result<RecordHandle, TrackerError> {
        let result = self.register(id, size_bytes, provenance.into());
        self.tally(result)
    }

    /// Record an allocation under a tracker-issued identity.
    ///
    /// Identities come from a monotonic counter; values already held by
    /// caller-supplied registrations are skipped.
    pub fn track(
        &mut self,
        size_bytes: u64,
        provenance: impl Into<ProvenanceKey>,
    ) -> Result<AllocId, TrackerError> {
        let mut id = self.ids.next_id();
        while self.registry.contains(id) {
            id = self.ids.next_id();
        }
        self.on_alloc(id, size_bytes, provenance)
            .map(|handle| handle.id())
    }

    /// Mark an allocation freed. Its edges are kept until compaction.
    ///
    /// # Errors
    ///
    /// [`TrackerError::InvalidState`] if `id` is already freed, purged, or
    /// was never registered.
    pub fn on_free(&mut self, id: AllocId) -> Result<(), TrackerError> {
        let result = self.free(id);
        self.tally(result)
    }

    /// Record that `from` references `to`. Returns whether a new edge was
    /// inserted; repeating an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if either endpoint has no record.
    pub fn on_ref_add(&mut self, from: AllocId, to: AllocId) -> Result<bool, TrackerError> {
        let result = self.graph.add_edge(&self.registry, from, to);
        if let Ok(true) = result {
            self.metrics.edges_added += 1;
            trace!(%from, %to, "reference added");
        }
        self.tally(result)
    }

    /// Record that `from` no longer references `to`. Returns whether an
    /// edge was removed; removing a missing edge is a no-op.
    pub fn on_ref_remove(&mut self, from: AllocId, to: AllocId) -> bool {
        let removed = self.graph.remove_edge(from, to);
        if removed {
            self.metrics.edges_removed += 1;
            trace!(%from, %to, "reference removed");
        }
        self.metrics.events_applied += 1;
        removed
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Whatever the matching `on_*` method returns.
    pub fn apply(&mut self, event: TrackerEvent) -> Result<(), TrackerError> {
        match event {
            TrackerEvent::Alloc {
                id,
                size_bytes,
                provenance,
            } => self.on_alloc(id, size_bytes, provenance).map(drop),
            TrackerEvent::Free { id } => self.on_free(id),
            TrackerEvent::RefAdd { from, to } => self.on_ref_add(from, to).map(drop),
            TrackerEvent::RefRemove { from, to } => {
                self.on_ref_remove(from, to);
                Ok(())
            }
        }
    }

    /// A new event queue sized by `config.event_queue_capacity`.
    pub fn event_queue(&self) -> EventQueue {
        EventQueue::new(self.config.event_queue_capacity)
    }

    /// Apply the events queued at call time, in arrival order.
    ///
    /// Rejected events do not stop the drain; they are collected in the
    /// report alongside their errors.
    pub fn drain(&mut self, queue: &EventQueue) -> DrainReport {
        let mut report = DrainReport::default();
        for event in queue.take_pending() {
            match self.apply(event.clone()) {
                Ok(()) => report.applied += 1,
                Err(err) => report.rejected.push((event, err)),
            }
        }
        if !report.rejected.is_empty() {
            debug!(
                applied = report.applied,
                rejected = report.rejected.len(),
                "event queue drained with rejections"
            );
        }
        report
    }

    fn register(
        &mut self,
        id: AllocId,
        size_bytes: u64,
        provenance: ProvenanceKey,
    ) -> Result<RecordHandle, TrackerError> {
        let timestamp = self.clock.now();
        let handle = self
            .registry
            .register(id, size_bytes, provenance.clone(), timestamp)?;
        self.purged.remove(&id);
        self.groups.insert(id);
        match self.anchors.get(&provenance) {
            Some(&anchor) => {
                self.groups.union(anchor, id)?;
            }
            None => {
                self.anchors.insert(provenance.clone(), id);
            }
        }
        trace!(%id, size_bytes, %provenance, "allocation registered");
        Ok(handle)
    }

    fn free(&mut self, id: AllocId) -> Result<(), TrackerError> {
        if !self.registry.contains(id) {
            return Err(TrackerError::InvalidState {
                id,
                state: self.state(id),
                operation: Operation::Free,
            });
        }
        let record = self.registry.mark_freed(id)?;
        debug!(%id, size_bytes = record.size_bytes, "allocation freed");
        Ok(())
    }

    fn tally<T>(&mut self, result: Result<T, TrackerError>) -> Result<T, TrackerError> {
        match &result {
            Ok(_) => self.metrics.events_applied += 1,
            Err(err) => {
                self.metrics.events_rejected += 1;
                debug!(error = %err, "tracker event rejected");
            }
        }
        result
    }

    // ── Records ─────────────────────────────────────────────────

    /// The record held for `id`, live or freed.
    pub fn lookup(&self, id: AllocId) -> Option<&Record> {
        self.registry.lookup(id)
    }

    /// The record for one specific registration; `None` once that
    /// registration has been purged, even if the identity was reused.
    pub fn resolve(&self, handle: RecordHandle) -> Option<&Record> {
        self.registry.resolve(handle)
    }

    /// Lifecycle state of `id`.
    ///
    /// Reports [`LifeState::Purged`] only while `remember_purged` is set;
    /// otherwise purged identities read as unregistered.
    pub fn state(&self, id: AllocId) -> LifeState {
        match self.registry.lookup(id) {
            Some(record) => record.state(),
            None if self.purged.contains(&id) => LifeState::Purged,
            None => LifeState::Unregistered,
        }
    }

    /// Every held record in registration order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.registry.iter()
    }

    /// Owned copy of every held record in registration order.
    pub fn snapshot(&self) -> Vec<Record> {
        self.registry.iter().cloned().collect()
    }

    /// Read access to the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Read access to the reference graph.
    pub fn graph(&self) -> &RefGraph {
        &self.graph
    }

    /// Outgoing references of `id` in insertion order.
    pub fn neighbors(&self, id: AllocId) -> Neighbors<'_> {
        self.graph.neighbors(id)
    }

    // ── Reachability ────────────────────────────────────────────

    /// Live allocations unreachable from `roots`, using the configured
    /// default strategy.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if a root has no record.
    pub fn leaks(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
    ) -> Result<BTreeSet<AllocId>, TrackerError> {
        self.leaks_with(roots, self.config.default_strategy)
    }

    /// Live allocations unreachable from `roots`.
    ///
    /// Zombie references are not inspected and never logged here; use
    /// [`report_with`](Self::report_with) to see them.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if a root has no record.
    pub fn leaks_with(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        strategy: Strategy,
    ) -> Result<BTreeSet<AllocId>, TrackerError> {
        let started = Instant::now();
        let leaks = self.analyzer().find_leaks(roots, strategy)?;
        self.scan.record(elapsed_us(started));
        Ok(leaks)
    }

    /// Leaks and zombie references, using the configured default strategy.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if a root has no record.
    pub fn report(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
    ) -> Result<LeakReport, TrackerError> {
        self.report_with(roots, self.config.default_strategy)
    }

    /// Leaks and zombie references from one walk.
    ///
    /// Logs a `warn!` when the report holds any zombie references.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if a root has no record.
    pub fn report_with(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        strategy: Strategy,
    ) -> Result<LeakReport, TrackerError> {
        let started = Instant::now();
        let report = self.analyzer().report(roots, strategy)?;
        self.scan.record(elapsed_us(started));
        if !report.zombies.is_empty() {
            warn!(
                zombies = report.zombies.len(),
                "leak scan found references to freed allocations"
            );
        }
        debug!(
            leaks = report.leaks.len(),
            leaked_bytes = report.leaked_bytes,
            reachable = report.reachable,
            "leak scan complete"
        );
        Ok(report)
    }

    /// Everything reachable from `roots`.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if a root has no record.
    pub fn reach(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        strategy: Strategy,
    ) -> Result<Reached, TrackerError> {
        self.analyzer().reach(roots, strategy)
    }

    /// Everything within `max_depth` edges of a root, with distances.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if a root has no record.
    pub fn reachable_within(
        &self,
        roots: impl IntoIterator<Item = AllocId>,
        max_depth: u32,
    ) -> Result<Reached, TrackerError> {
        self.analyzer().breadth_first(roots, Some(max_depth))
    }

    fn analyzer(&self) -> Analyzer<'_, Registry> {
        Analyzer::new(&self.graph, &self.registry)
    }

    // ── Groups ──────────────────────────────────────────────────

    /// Representative of `id`'s group, compressing the lookup path.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if `id` has no record.
    pub fn find(&mut self, id: AllocId) -> Result<AllocId, TrackerError> {
        self.groups.find(id)
    }

    /// Representative of `id`'s group, without mutation.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if `id` has no record.
    pub fn group_of(&self, id: AllocId) -> Result<AllocId, TrackerError> {
        self.groups.root_of(id)
    }

    /// Merge the groups of `a` and `b`, returning the new representative.
    ///
    /// # Errors
    ///
    /// [`TrackerError::UnknownIdentity`] if either identity has no record.
    pub fn union(&mut self, a: AllocId, b: AllocId) -> Result<AllocId, TrackerError> {
        self.groups.union(a, b)
    }

    /// Current partition: representative → members.
    pub fn groups(&self) -> Groups {
        self.groups.groups()
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.set_count()
    }

    /// Live count and live bytes per provenance key.
    pub fn provenance_summary(&self) -> ProvenanceSummary {
        let mut summary = ProvenanceSummary::with_hasher(RandomState::new());
        for record in self.registry.iter_live() {
            let totals = summary.entry(record.provenance.clone()).or_default();
            totals.live_count += 1;
            totals.live_bytes = totals.live_bytes.saturating_add(record.size_bytes);
        }
        summary
    }

    // ── Maintenance and reporting ──────────────────────────────

    /// Purge every freed record and its incident edges. Returns the number
    /// of records purged.
    pub fn compact(&mut self) -> usize {
        let purged = self.registry.compact();
        self.metrics.compactions += 1;
        if purged.is_empty() {
            return 0;
        }

        let edges = self.graph.detach(purged.iter().copied());
        let registry = &self.registry;
        self.groups.retain(|id| registry.contains(id));
        self.anchors.clear();
        for record in self.registry.iter() {
            self.anchors
                .entry(record.provenance.clone())
                .or_insert(record.id);
        }
        if self.config.remember_purged {
            self.purged.extend(purged.iter().copied());
        }

        let count = purged.len();
        self.metrics.records_purged += count as u64;
        self.metrics.edges_removed += edges as u64;
        info!(purged = count, edges_removed = edges, "compacted freed records");
        count
    }

    /// Current totals. O(1).
    pub fn stats(&self) -> Stats {
        Stats {
            live_count: self.registry.live_count(),
            freed_count: self.registry.freed_count(),
            edge_count: self.graph.edge_count(),
            live_bytes: self.registry.live_bytes(),
            freed_bytes: self.registry.freed_bytes(),
            total_registered: self.registry.total_registered(),
            group_count: self.groups.set_count(),
        }
    }

    /// Close the current frame and append its totals to the history.
    ///
    /// The history keeps the most recent `config.frame_history` entries.
    pub fn next_frame(&mut self) -> FrameStats {
        self.frame += 1;
        let total = self.registry.total_registered();
        let stats = FrameStats {
            frame: self.frame,
            live_count: self.registry.live_count(),
            live_bytes: self.registry.live_bytes(),
            edge_count: self.graph.edge_count(),
            registered: total - self.frame_start_registered,
        };
        self.frame_start_registered = total;
        if self.frames.len() == self.config.frame_history {
            self.frames.pop_front();
        }
        self.frames.push_back(stats);
        debug!(
            frame = stats.frame,
            live = stats.live_count,
            live_bytes = stats.live_bytes,
            "frame closed"
        );
        stats
    }

    /// Number of frames closed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Retained frame history, oldest first.
    pub fn frames(&self) -> impl DoubleEndedIterator<Item = &FrameStats> + ExactSizeIterator {
        self.frames.iter()
    }

    /// Cumulative operational counters.
    pub fn metrics(&self) -> TrackerMetrics {
        let mut metrics = self.metrics.clone();
        self.scan.fill(&mut metrics);
        metrics
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::from_valid(TrackerConfig::default())
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("records", &self.registry.len())
            .field("live", &self.registry.live_count())
            .field("edges", &self.graph.edge_count())
            .field("groups", &self.groups.set_count())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

fn elapsed_us(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
}
