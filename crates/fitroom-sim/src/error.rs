//! Driver error types.

use std::{io, time::Duration};

use fitroom_core::{Category, ConfigError, RoomError};
use thiserror::Error;

/// Errors that can occur while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration rejected before any worker was created.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Dwell range with `min > max`.
    #[error("invalid dwell range: {min:?} exceeds {max:?}")]
    InvalidDwell {
        /// Lower bound.
        min: Duration,
        /// Upper bound.
        max: Duration,
    },

    /// A worker hit a fatal room error; the run was aborted.
    #[error("room error: {0}")]
    Room(#[from] RoomError),

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// A worker's occupancy action panicked.
    #[error("{category} worker panicked")]
    WorkerPanicked {
        /// Category of the panicking worker.
        category: Category,
    },

    /// Interactive input could not be parsed.
    #[error("invalid input for {field}: {input:?}")]
    InvalidInput {
        /// What was being asked for.
        field: &'static str,
        /// What the user typed.
        input: String,
    },

    /// Input ended before a value was entered.
    #[error("input closed before {field} was entered")]
    MissingInput {
        /// What was being asked for.
        field: &'static str,
    },

    /// Terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl SimError {
    /// Returns true if the error was raised before any worker started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_)
                | Self::InvalidDwell { .. }
                | Self::InvalidInput { .. }
                | Self::MissingInput { .. }
        )
    }
}
