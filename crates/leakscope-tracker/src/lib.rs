//! Tracker facade for leakscope.
//!
//! [`Tracker`] coordinates the allocation registry, the reference graph,
//! the reachability analyzer, and the grouping engine behind one event
//! and query surface. Supporting modules:
//!
//! - [`config`]: [`TrackerConfig`] and its validation.
//! - [`events`]: bounded [`EventQueue`] for deferred event delivery.
//! - [`metrics`]: [`Stats`], per-frame [`FrameStats`], and cumulative
//!   [`TrackerMetrics`].
//! - [`shared`]: [`SharedTracker`] for multi-threaded hosts.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod clock;
pub mod config;
pub mod events;
pub mod metrics;
pub mod shared;
pub mod tracker;

pub use config::{ClockSource, ConfigError, TrackerConfig};
pub use events::{DrainReport, EventQueue, EventSender, QueueError, TrackerEvent};
pub use metrics::{FrameStats, ProvenanceTotals, Stats, TrackerMetrics};
pub use shared::SharedTracker;
pub use tracker::{ProvenanceSummary, Tracker};
