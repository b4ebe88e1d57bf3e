//! Allocation registry for the leakscope tracker.
//!
//! [`Registry`] maps each [`AllocId`](leakscope_core::AllocId) to its
//! [`Record`](leakscope_core::Record). Lookups hash the identity with
//! `ahash`, which mixes every input bit, so identity distributions with
//! long runs of equal low bits (aligned addresses, strided slot indices)
//! still spread evenly across buckets.
//!
//! Records are kept in registration order. Freed records stay in place
//! until [`Registry::compact`] removes them; that is the only operation
//! that drops records.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod registry;

pub use registry::Registry;
