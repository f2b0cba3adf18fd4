//! Worker identity and lifecycle states.

use std::fmt;

/// Sequence number assigned to a worker when it enters the room.
///
/// The n-th worker to enter receives id n, starting at 1. Ids are unique and
/// strictly increasing across a run regardless of category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u64);

impl WorkerId {
    /// Raw sequence number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a worker running the room protocol.
///
/// ```text
/// Created ─turnstile+lightswitch─▶ Queued ─permit─▶ Admitted
///    ─on_enter─▶ Occupying ─on_exit+unregister─▶ Departed
/// ```
///
/// Every worker walks this sequence exactly once. `Departed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Not yet at the turnstile.
    Created,
    /// Past the turnstile and registered with its category gate.
    Queued,
    /// Holding a capacity permit, about to occupy.
    Admitted,
    /// Inside the room running the occupancy action.
    Occupying,
    /// Left the room. Terminal.
    Departed,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Queued => "queued",
            Self::Admitted => "admitted",
            Self::Occupying => "occupying",
            Self::Departed => "departed",
        };
        f.write_str(name)
    }
}
