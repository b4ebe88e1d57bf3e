//! Error types for the leakscope tracker.
//!
//! Every error is a caller-input error raised synchronously by the call
//! that caused it. There is no transient or fatal class: all operations
//! are in-memory data-structure updates.

use std::fmt;

use thiserror::Error;

use crate::id::AllocId;
use crate::record::LifeState;

/// Operation named in [`TrackerError::InvalidState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Registering an allocation.
    Register,
    /// Marking an allocation freed.
    Free,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register => f.write_str("register"),
            Self::Free => f.write_str("free"),
        }
    }
}

/// Errors raised by the registry, graph, grouping engine, and tracker.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// An identity was registered while a live record already holds it.
    #[error("identity {id} is already registered and live")]
    DuplicateIdentity {
        /// The identity that was registered twice.
        id: AllocId,
    },
    /// An identity was referenced that the component does not hold: never
    /// registered, or already purged.
    #[error("unknown identity {id}")]
    UnknownIdentity {
        /// The unrecognised identity.
        id: AllocId,
    },
    /// A lifecycle transition was attempted out of order.
    #[error("cannot {operation} identity {id}: it is {state}")]
    InvalidState {
        /// The identity whose transition was rejected.
        id: AllocId,
        /// The state the identity was in.
        state: LifeState,
        /// The rejected operation.
        operation: Operation,
    },
}

impl TrackerError {
    /// The identity the error refers to.
    pub fn id(&self) -> AllocId {
        match self {
            Self::DuplicateIdentity { id }
            | Self::UnknownIdentity { id }
            | Self::InvalidState { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_identity_and_state() {
        let err = TrackerError::InvalidState {
            id: AllocId(9),
            state: LifeState::Freed,
            operation: Operation::Free,
        };
        assert_eq!(err.to_string(), "cannot free identity #9: it is freed");
        assert_eq!(err.id(), AllocId(9));
    }

    #[test]
    fn unknown_identity_display() {
        let err = TrackerError::UnknownIdentity { id: AllocId(1) };
        assert_eq!(err.to_string(), "unknown identity #1");
    }
}
