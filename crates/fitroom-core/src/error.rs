//! Room error types.

use thiserror::Error;

use crate::{category::Category, wait::WaitStage, worker::WorkerId};

/// Rejected room configuration.
///
/// Raised before any worker is created; a run never starts partially.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Room capacity was zero or negative.
    #[error("the number of slots should be positive, got {0}")]
    NonPositiveCapacity(i64),

    /// A worker count was negative.
    #[error("the number of {category} workers should be nonnegative, got {count}")]
    NegativeWorkers {
        /// Category whose count was negative.
        category: Category,
        /// The rejected count.
        count: i64,
    },

    /// Both worker counts were zero.
    #[error("no workers to synchronize")]
    NoWorkers,

    /// A value does not fit the platform's address space.
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: i64,
    },
}

/// Broken safety invariant inside the core.
///
/// Violations indicate a programming error in the integration, never a
/// runtime condition. Callers abort the run when they see one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// A category gate was unregistered more often than registered.
    #[error("{category} worker left without a matching enter")]
    UnmatchedExit {
        /// Category of the departing worker.
        category: Category,
    },

    /// An exit was recorded while the room was empty.
    #[error("worker {id} left an empty room, occupancy would go negative")]
    NegativeOccupancy {
        /// Worker that tried to leave.
        id: WorkerId,
    },

    /// The exclusion lock was released on behalf of a category not holding it.
    #[error("exclusion lock released by {releaser} while held by {holder:?}")]
    ForeignRelease {
        /// Category attempting the release.
        releaser: Category,
        /// Actual holder at the time.
        holder: Option<Category>,
    },

    /// More permits were returned than the limiter was created with.
    #[error("{category} permit released beyond capacity {capacity}")]
    PermitOverflow {
        /// Category of the limiter.
        category: Category,
        /// Configured capacity.
        capacity: usize,
    },

    /// A worker was admitted while the other category occupied the room.
    #[error("{entering} worker entered while {occupying} occupies the room")]
    MixedOccupancy {
        /// Category being admitted.
        entering: Category,
        /// Category currently inside.
        occupying: Category,
    },
}

/// Errors from room protocol operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// A core invariant was broken.
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] Violation),

    /// A bounded wait expired. Nothing acquired during the attempt is kept.
    #[error("{category} worker timed out waiting at the {stage}")]
    Timeout {
        /// Category of the worker that gave up.
        category: Category,
        /// Where it was waiting.
        stage: WaitStage,
    },
}

impl RoomError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors mean the room's invariants can no longer be trusted.
    /// Timeouts are recoverable: the caller may retry or abandon the worker.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::ProtocolViolation(_) => true,
            Self::Timeout { .. } => false,
        }
    }
}
