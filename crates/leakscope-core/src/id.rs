//! Strongly-typed identifiers: allocation identities, provenance keys,
//! and timestamps.

use std::fmt;
use std::sync::Arc;

/// Identifies one tracked allocation.
///
/// An opaque `u64` token chosen at the instrumentation boundary: an
/// address-derived value, an arena slot index, or a value drawn from an
/// [`IdAllocator`]. The tracker only requires that a token is unique among
/// the records currently held by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocId(pub u64);

impl fmt::Display for AllocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for AllocId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Monotonic source of [`AllocId`]s.
///
/// Owned by a single tracker instance, never process-global. Values wrap
/// on overflow; callers that mix allocator-issued and caller-supplied ids
/// must check for collisions (the tracker facade does).
#[derive(Clone, Debug)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// First id handed out by [`IdAllocator::new`].
    pub const FIRST: u64 = 1;

    /// Create an allocator whose first id is [`IdAllocator::FIRST`].
    pub const fn new() -> Self {
        Self { next: Self::FIRST }
    }

    /// Create an allocator whose first id is `first`.
    pub const fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Hand out the next id.
    pub fn next_id(&mut self) -> AllocId {
        let id = AllocId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// The id the next call to [`next_id`](IdAllocator::next_id) returns.
    pub fn peek(&self) -> AllocId {
        AllocId(self.next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Label for the function or type that produced an allocation.
///
/// Backed by `Arc<str>` so records, groups, and per-provenance summaries
/// share one buffer per key. Equality and hashing are by string content.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProvenanceKey(Arc<str>);

impl ProvenanceKey {
    /// Create a key from any string-like value.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProvenanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProvenanceKey {
    fn from(v: &str) -> Self {
        Self(Arc::from(v))
    }
}

impl From<String> for ProvenanceKey {
    fn from(v: String) -> Self {
        Self(Arc::from(v))
    }
}

impl AsRef<str> for ProvenanceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Creation time of a record.
///
/// Either a registration sequence number or microseconds since the tracker
/// was constructed, depending on the tracker's clock source. Comparable
/// only between records of the same tracker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
