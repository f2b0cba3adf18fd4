//! Wait policy for the protocol's blocking stages.
//!
//! By default every suspension point waits forever. A bounded policy turns
//! every wait of one `enter` call into a single deadline; expiry surfaces as
//! [`RoomError::Timeout`](crate::RoomError::Timeout) naming the stage.

use std::{
    fmt,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, MutexGuard};

/// How long a worker may block while entering the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Block until admitted.
    #[default]
    Unbounded,

    /// Give up once the whole entry sequence exceeds this duration.
    Timeout(Duration),
}

impl WaitPolicy {
    /// Deadline for an entry attempt starting now.
    pub fn deadline(self) -> Deadline {
        match self {
            Self::Unbounded => Deadline::Never,
            Self::Timeout(limit) => {
                Instant::now().checked_add(limit).map_or(Deadline::Never, Deadline::At)
            },
        }
    }
}

/// Absolute point after which a blocking wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Never give up.
    Never,
    /// Give up at this instant.
    At(Instant),
}

impl Deadline {
    /// Block on `cond` until notified or the deadline passes.
    ///
    /// Returns `false` if the deadline passed. Callers re-check their
    /// condition either way; spurious wakeups are allowed.
    pub(crate) fn wait<T>(self, cond: &Condvar, guard: &mut MutexGuard<'_, T>) -> bool {
        match self {
            Self::Never => {
                cond.wait(guard);
                true
            },
            Self::At(at) => !cond.wait_until(guard, at).timed_out(),
        }
    }
}

/// The three suspension points of the entry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitStage {
    /// Waiting to pass the fairness gate.
    Turnstile,
    /// First of its category, waiting for the other category to clear out.
    Exclusion,
    /// Waiting for a free slot.
    Capacity,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Turnstile => "turnstile",
            Self::Exclusion => "exclusion lock",
            Self::Capacity => "capacity limiter",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_policy_default() {
        assert_eq!(WaitPolicy::default(), WaitPolicy::Unbounded);
        assert_eq!(WaitPolicy::default().deadline(), Deadline::Never);
    }

    #[test]
    fn timeout_deadline_is_in_the_future() {
        let before = Instant::now();
        match WaitPolicy::Timeout(Duration::from_millis(100)).deadline() {
            Deadline::At(at) => assert!(at >= before + Duration::from_millis(100)),
            Deadline::Never => panic!("expected a bounded deadline"),
        }
    }

    #[test]
    fn overflowing_timeout_never_expires() {
        assert_eq!(WaitPolicy::Timeout(Duration::MAX).deadline(), Deadline::Never);
    }
}
