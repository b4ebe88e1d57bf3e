//! Timestamp source for new records.

use std::time::Instant;

use leakscope_core::Timestamp;

use crate::config::ClockSource;

/// Produces the [`Timestamp`] stamped on each registration.
#[derive(Clone, Debug)]
pub(crate) enum Clock {
    Sequence { next: u64 },
    Wall { origin: Instant },
}

impl Clock {
    pub(crate) fn new(source: ClockSource) -> Self {
        match source {
            ClockSource::Sequence => Self::Sequence { next: 0 },
            ClockSource::WallClock => Self::Wall {
                origin: Instant::now(),
            },
        }
    }

    pub(crate) fn now(&mut self) -> Timestamp {
        match self {
            Self::Sequence { next } => {
                let t = *next;
                *next += 1;
                Timestamp(t)
            }
            Self::Wall { origin } => {
                let us = origin.elapsed().as_micros();
                Timestamp(u64::try_from(us).unwrap_or(u64::MAX))
            }
        }
    }
}
