//! Lookup trait shared by the registry and its consumers.

use crate::id::AllocId;
use crate::record::Record;

/// Read-only identity lookup over a set of allocation records.
///
/// Implemented by the registry. The reference graph and the reachability
/// analyzer take `&impl RecordLookup` to validate endpoints and roots, so
/// they never depend on the registry's concrete storage.
pub trait RecordLookup {
    /// The record for `id`, if one is held.
    fn record(&self, id: AllocId) -> Option<&Record>;

    /// Whether a record (live or freed) is held for `id`.
    fn contains(&self, id: AllocId) -> bool {
        self.record(id).is_some()
    }

    /// `Some(true)` for live records, `Some(false)` for freed ones, `None`
    /// when no record is held.
    fn is_alive(&self, id: AllocId) -> Option<bool> {
        self.record(id).map(|r| r.alive)
    }

    /// Every live record, in the implementor's iteration order.
    fn live_records(&self) -> impl Iterator<Item = &Record>;
}
