//! Tracker configuration, validation, and error types.
//!
//! [`TrackerConfig`] is consumed by [`Tracker::new`](crate::Tracker::new),
//! which calls [`validate()`](TrackerConfig::validate) before building any
//! state. The default configuration is always valid.

use leakscope_graph::Strategy;

// ── ClockSource ────────────────────────────────────────────────────

/// Where record timestamps come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ClockSource {
    /// Monotonic counter advanced on every registration attempt. Deterministic.
    #[default]
    Sequence,
    /// Microseconds since the tracker was constructed.
    WallClock,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Upper bound on [`TrackerConfig::initial_capacity`].
pub const MAX_INITIAL_CAPACITY: usize = 1 << 24;

/// Errors detected during [`TrackerConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `frame_history` is zero.
    #[error("frame_history must be at least 1")]
    FrameHistoryZero,
    /// `event_queue_capacity` is zero.
    #[error("event_queue_capacity must be at least 1")]
    EventQueueZero,
    /// `initial_capacity` exceeds [`MAX_INITIAL_CAPACITY`].
    #[error("initial_capacity {configured} exceeds maximum of {max}", max = MAX_INITIAL_CAPACITY)]
    CapacityTooLarge {
        /// The configured value.
        configured: usize,
    },
}

// ── TrackerConfig ──────────────────────────────────────────────────

/// Complete configuration for constructing a [`Tracker`](crate::Tracker).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig {
    /// Timestamp source for new records. Default: [`ClockSource::Sequence`].
    pub clock: ClockSource,
    /// Walk order used by leak scans that do not name one. Default: DFS.
    pub default_strategy: Strategy,
    /// Number of [`FrameStats`](crate::FrameStats) entries retained.
    /// Default: 600. Minimum: 1.
    pub frame_history: usize,
    /// Remember purged identities so `state()` can report
    /// [`LifeState::Purged`](leakscope_core::LifeState::Purged). Default: true.
    pub remember_purged: bool,
    /// Bound of queues created by
    /// [`Tracker::event_queue`](crate::Tracker::event_queue). Default: 4096.
    pub event_queue_capacity: usize,
    /// Pre-sizing hint for the registry, graph, and grouping engine.
    /// Default: 0.
    pub initial_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            clock: ClockSource::Sequence,
            default_strategy: Strategy::DepthFirst,
            frame_history: 600,
            remember_purged: true,
            event_queue_capacity: 4096,
            initial_capacity: 0,
        }
    }
}

impl TrackerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_history == 0 {
            return Err(ConfigError::FrameHistoryZero);
        }
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::EventQueueZero);
        }
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                configured: self.initial_capacity,
            });
        }
        Ok(())
    }
}
