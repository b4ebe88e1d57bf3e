//! Core types and traits for the leakscope allocation tracker.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other leakscope crate: allocation
//! identities, provenance keys, timestamps, allocation records, the
//! per-identity lifecycle state, the error type, and the lookup trait
//! that lets the reference graph validate identities without depending
//! on the registry crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod record;
pub mod traits;

pub use error::{Operation, TrackerError};
pub use id::{AllocId, IdAllocator, ProvenanceKey, Timestamp};
pub use record::{LifeState, Record, RecordHandle};
pub use traits::RecordLookup;
