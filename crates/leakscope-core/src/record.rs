//! Allocation records, record handles, and the per-identity lifecycle.

use std::fmt;

use crate::id::{AllocId, ProvenanceKey, Timestamp};

/// One tracked allocation.
///
/// Created when an allocation is reported and kept until compaction, even
/// after it is freed, so leak reports stay reproducible until the caller
/// explicitly asks for freed records to be purged.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    /// Identity of the allocation.
    pub id: AllocId,
    /// Size in bytes at allocation time. Not updated afterwards.
    pub size_bytes: u64,
    /// Function or type that produced the allocation.
    pub provenance: ProvenanceKey,
    /// Creation time.
    pub timestamp: Timestamp,
    /// Registration sequence number, unique for the registry's lifetime.
    pub seq: u64,
    /// `false` once the allocation has been reported freed.
    pub alive: bool,
}

impl Record {
    /// Handle pinning this record's identity to its registration.
    pub fn handle(&self) -> RecordHandle {
        RecordHandle {
            id: self.id,
            seq: self.seq,
        }
    }

    /// Lifecycle state implied by the `alive` flag.
    pub fn state(&self) -> LifeState {
        if self.alive {
            LifeState::Live
        } else {
            LifeState::Freed
        }
    }
}

/// Reference to one specific registration of an identity.
///
/// Identities may be reused after their record is purged. A handle keeps
/// the registration sequence number alongside the identity so a lookup by
/// handle can tell the original record apart from a later one that reuses
/// the same identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordHandle {
    id: AllocId,
    seq: u64,
}

impl RecordHandle {
    /// The identity this handle refers to.
    pub fn id(&self) -> AllocId {
        self.id
    }

    /// Registration sequence number of the referenced record.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordHandle({}, seq={})", self.id, self.seq)
    }
}

/// Lifecycle of an identity as seen by the tracker.
///
/// `Unregistered → Live → Freed → Purged`. A purged identity may be
/// registered again, which starts a new `Live` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifeState {
    /// Never reported to the tracker.
    Unregistered,
    /// Allocated and not yet freed.
    Live,
    /// Freed, record retained until the next compaction.
    Freed,
    /// Freed and removed by compaction.
    Purged,
}

impl fmt::Display for LifeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unregistered => "unregistered",
            Self::Live => "live",
            Self::Freed => "freed",
            Self::Purged => "purged",
        };
        f.write_str(s)
    }
}
