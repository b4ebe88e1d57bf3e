//! Reference graph and reachability analysis for the leakscope tracker.
//!
//! - [`graph`]: [`RefGraph`], the mutable set of "A references B" edges.
//! - [`reach`]: [`Analyzer`], depth-first and breadth-first walks from a
//!   root set, leak classification, and zombie-reference detection.
//!
//! Both modules validate identities through
//! [`RecordLookup`](leakscope_core::RecordLookup) rather than a concrete
//! registry type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod graph;
pub mod reach;

pub use graph::{Neighbors, RefGraph};
pub use reach::{Analyzer, LeakReport, Reached, Strategy, ZombieRef};
