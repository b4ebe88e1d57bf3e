//! Provenance grouping for the leakscope tracker.
//!
//! [`DisjointSets`] partitions allocation identities into groups. The
//! tracker seeds one group per provenance key; callers may merge further
//! with [`DisjointSets::union`]. Groups have no stored entity: a group is
//! named by its representative identity, and the full partition is only
//! materialized by [`DisjointSets::groups`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dsu;

pub use dsu::{DisjointSets, Groups};
