//! Point-in-time statistics, per-frame history entries, and cumulative
//! operational counters.
//!
//! [`Stats`] is computed from the tracker's counters in O(1).
//! [`FrameStats`] is what [`Tracker::next_frame`](crate::Tracker::next_frame)
//! appends to the bounded frame history. [`TrackerMetrics`] accumulates
//! over the tracker's lifetime and is never reset.

use std::sync::atomic::{AtomicU64, Ordering};

/// Current totals of the tracked model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stats {
    /// Records still alive.
    pub live_count: usize,
    /// Records freed but not yet compacted.
    pub freed_count: usize,
    /// Reference edges currently held.
    pub edge_count: usize,
    /// Sum of `size_bytes` over live records.
    pub live_bytes: u64,
    /// Sum of `size_bytes` over freed, uncompacted records.
    pub freed_bytes: u64,
    /// Registrations accepted over the tracker's lifetime.
    pub total_registered: u64,
    /// Disjoint provenance groups.
    pub group_count: usize,
}

/// One entry of the frame history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrameStats {
    /// Frame number, starting at 1 for the first completed frame.
    pub frame: u64,
    /// Live records at the end of the frame.
    pub live_count: usize,
    /// Live bytes at the end of the frame.
    pub live_bytes: u64,
    /// Reference edges at the end of the frame.
    pub edge_count: usize,
    /// Registrations accepted during the frame.
    pub registered: u64,
}

/// Live totals for one provenance key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProvenanceTotals {
    /// Live records with this key.
    pub live_count: usize,
    /// Sum of `size_bytes` over those records.
    pub live_bytes: u64,
}

/// Cumulative counters for the tracker's operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrackerMetrics {
    /// Events accepted (allocations, frees, edge changes).
    pub events_applied: u64,
    /// Events rejected with a [`TrackerError`](leakscope_core::TrackerError).
    pub events_rejected: u64,
    /// Edges inserted. Duplicate inserts are not counted.
    pub edges_added: u64,
    /// Edges removed, explicitly or by compaction.
    pub edges_removed: u64,
    /// Calls to `compact()`.
    pub compactions: u64,
    /// Records purged by compaction.
    pub records_purged: u64,
    /// Leak scans run.
    pub scans: u64,
    /// Duration of the most recent leak scan, in microseconds.
    pub last_scan_us: u64,
}

/// Scan timing updated from `&self` query paths.
///
/// Leak scans take the read side of a shared tracker, so the counters they
/// touch are atomics rather than plain fields.
#[derive(Debug, Default)]
pub(crate) struct ScanCounters {
    scans: AtomicU64,
    last_scan_us: AtomicU64,
}

impl ScanCounters {
    pub(crate) fn record(&self, elapsed_us: u64) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.last_scan_us.store(elapsed_us, Ordering::Relaxed);
    }

    pub(crate) fn fill(&self, metrics: &mut TrackerMetrics) {
        metrics.scans = self.scans.load(Ordering::Relaxed);
        metrics.last_scan_us = self.last_scan_us.load(Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = TrackerMetrics::default();
        assert_eq!(m.events_applied, 0);
        assert_eq!(m.events_rejected, 0);
        assert_eq!(m.edges_added, 0);
        assert_eq!(m.edges_removed, 0);
        assert_eq!(m.compactions, 0);
        assert_eq!(m.records_purged, 0);
        assert_eq!(m.scans, 0);
        assert_eq!(m.last_scan_us, 0);
    }

    #[test]
    fn scan_counters_fill_snapshot() {
        let counters = ScanCounters::default();
        counters.record(40);
        counters.record(25);
        let mut m = TrackerMetrics::default();
        counters.fill(&mut m);
        assert_eq!(m.scans, 2);
        assert_eq!(m.last_scan_us, 25);
    }
}
