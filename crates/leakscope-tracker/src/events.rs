//! Deferred tracker events.
//!
//! Instrumentation sites that cannot borrow the tracker (allocator hooks,
//! other threads) push [`TrackerEvent`]s through an [`EventSender`] into a
//! bounded [`EventQueue`]. The tracker's owner later calls
//! [`Tracker::drain`](crate::Tracker::drain), which applies the queued
//! events in arrival order and returns a [`DrainReport`].

use crossbeam_channel::{Receiver, Sender, TrySendError};

use leakscope_core::{AllocId, ProvenanceKey, TrackerError};

/// One inbound event, as accepted by [`Tracker::apply`](crate::Tracker::apply).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackerEvent {
    /// An allocation was made.
    Alloc {
        /// Identity of the new allocation.
        id: AllocId,
        /// Allocation size.
        size_bytes: u64,
        /// Allocating function or type.
        provenance: ProvenanceKey,
    },
    /// An allocation was freed.
    Free {
        /// Identity of the freed allocation.
        id: AllocId,
    },
    /// `from` now holds a reference to `to`.
    RefAdd {
        /// Holder.
        from: AllocId,
        /// Target.
        to: AllocId,
    },
    /// `from` dropped its reference to `to`.
    RefRemove {
        /// Holder.
        from: AllocId,
        /// Target.
        to: AllocId,
    },
}

/// Why an event could not be queued.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue is at capacity.
    #[error("event queue is full")]
    Full(TrackerEvent),
    /// The queue has been dropped.
    #[error("event queue is closed")]
    Closed(TrackerEvent),
}

impl QueueError {
    /// Recover the event that was not queued.
    pub fn into_event(self) -> TrackerEvent {
        match self {
            Self::Full(e) | Self::Closed(e) => e,
        }
    }
}

/// Producer side of an [`EventQueue`]. Cheap to clone; `Send + Sync`.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: Sender<TrackerEvent>,
}

impl EventSender {
    /// Queue an event without blocking.
    ///
    /// # Errors
    ///
    /// [`QueueError::Full`] when the queue is at capacity,
    /// [`QueueError::Closed`] when the queue has been dropped. Either way
    /// the event is handed back inside the error.
    pub fn send(&self, event: TrackerEvent) -> Result<(), QueueError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(ev) => QueueError::Full(ev),
            TrySendError::Disconnected(ev) => QueueError::Closed(ev),
        })
    }

    /// Queue [`TrackerEvent::Alloc`].
    pub fn alloc(
        &self,
        id: AllocId,
        size_bytes: u64,
        provenance: impl Into<ProvenanceKey>,
    ) -> Result<(), QueueError> {
        self.send(TrackerEvent::Alloc {
            id,
            size_bytes,
            provenance: provenance.into(),
        })
    }

    /// Queue [`TrackerEvent::Free`].
    pub fn free(&self, id: AllocId) -> Result<(), QueueError> {
        self.send(TrackerEvent::Free { id })
    }

    /// Queue [`TrackerEvent::RefAdd`].
    pub fn ref_add(&self, from: AllocId, to: AllocId) -> Result<(), QueueError> {
        self.send(TrackerEvent::RefAdd { from, to })
    }

    /// Queue [`TrackerEvent::RefRemove`].
    pub fn ref_remove(&self, from: AllocId, to: AllocId) -> Result<(), QueueError> {
        self.send(TrackerEvent::RefRemove { from, to })
    }
}

/// Bounded multi-producer event queue.
///
/// Owned by whoever owns the tracker. Producers hold [`EventSender`]s.
#[derive(Debug)]
pub struct EventQueue {
    tx: Sender<TrackerEvent>,
    rx: Receiver<TrackerEvent>,
    capacity: usize,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "EventQueue capacity must be at least 1");
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// A new producer handle.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Maximum number of queued events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Take at most the events queued at call time, in arrival order.
    ///
    /// Events pushed concurrently after the call started are left for the
    /// next drain, so a busy producer cannot keep a drain running.
    pub(crate) fn take_pending(&self) -> impl Iterator<Item = TrackerEvent> + '_ {
        let pending = self.rx.len();
        (0..pending).map_while(move |_| self.rx.try_recv().ok())
    }
}

/// Outcome of one [`Tracker::drain`](crate::Tracker::drain).
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Events applied successfully.
    pub applied: usize,
    /// Events the tracker rejected, in arrival order.
    pub rejected: Vec<(TrackerEvent, TrackerError)>,
}

impl DrainReport {
    /// Total events taken off the queue.
    pub fn drained(&self) -> usize {
        self.applied + self.rejected.len()
    }
}
