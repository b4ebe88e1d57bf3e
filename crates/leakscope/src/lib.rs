//! leakscope: allocation tracking and leak detection by reachability.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all leakscope sub-crates. For most users, adding `leakscope` as a single
//! dependency is sufficient.
//!
//! leakscope observes allocation, free, and reference events reported by
//! instrumentation and answers two questions about the model it builds:
//! which live allocations can no longer be reached from the program's
//! roots, and which allocations belong together by provenance. It never
//! frees memory itself.
//!
//! # Quick start
//!
//! ```rust
//! use leakscope::prelude::*;
//!
//! let mut tracker = Tracker::new(TrackerConfig::default()).unwrap();
//! let world = tracker.track(256, "World::new").unwrap();
//! let enemy = tracker.track(64, "spawn_enemy").unwrap();
//! let orphan = tracker.track(64, "spawn_enemy").unwrap();
//! tracker.on_ref_add(world, enemy).unwrap();
//!
//! let report = tracker.report([world]).unwrap();
//! assert!(report.leaks.contains(&orphan));
//! assert_eq!(report.leaked_bytes, 64);
//!
//! // Both enemies share a provenance group.
//! assert_eq!(tracker.find(enemy).unwrap(), tracker.find(orphan).unwrap());
//!
//! tracker.on_free(orphan).unwrap();
//! assert!(tracker.leaks([world]).unwrap().is_empty());
//! assert_eq!(tracker.compact(), 1);
//! assert_eq!(tracker.state(orphan), LifeState::Purged);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `leakscope-core` | Identities, records, lifecycle states, errors |
//! | [`registry`] | `leakscope-registry` | Allocation registry |
//! | [`graph`] | `leakscope-graph` | Reference graph and reachability analyzer |
//! | [`group`] | `leakscope-group` | Disjoint-set provenance grouping |
//! | [`tracker`] | `leakscope-tracker` | Tracker facade, config, events, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identities, records, and error types (`leakscope-core`).
pub use leakscope_core as types;

/// Allocation registry (`leakscope-registry`).
///
/// [`registry::Registry`] can be used directly by callers that want the
/// store without the rest of the tracker.
pub use leakscope_registry as registry;

/// Reference graph and reachability analysis (`leakscope-graph`).
///
/// [`graph::RefGraph`] holds the edges; [`graph::Analyzer`] walks them
/// depth-first or breadth-first.
pub use leakscope_graph as graph;

/// Disjoint-set grouping (`leakscope-group`).
pub use leakscope_group as group;

/// Tracker facade (`leakscope-tracker`).
///
/// [`tracker::Tracker`] for single-owner use, [`tracker::SharedTracker`]
/// for multi-threaded hosts, [`tracker::EventQueue`] for deferred events.
pub use leakscope_tracker as tracker;

/// Common imports for typical leakscope usage.
///
/// ```rust
/// use leakscope::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use leakscope_core::{
        AllocId, LifeState, ProvenanceKey, Record, RecordHandle, Timestamp, TrackerError,
    };

    // Reachability
    pub use leakscope_graph::{LeakReport, Strategy, ZombieRef};

    // Tracker
    pub use leakscope_tracker::{
        ClockSource, ConfigError, EventQueue, EventSender, FrameStats, SharedTracker, Stats,
        Tracker, TrackerConfig, TrackerEvent, TrackerMetrics,
    };
}
