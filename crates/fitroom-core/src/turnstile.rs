//! Turnstile: single-file passage for every arrival.
//!
//! A worker holds the turnstile only while registering with its category
//! gate. When that registration blocks on the exclusion lock, the turnstile
//! stays held and all later arrivals of both categories queue behind it.
//! Same-category workers can no longer refresh the exclusion lock ahead of a
//! waiting worker of the other category.
//!
//! Passage is handed off with a fair unlock, so queued workers pass in the
//! order they parked.

use parking_lot::{Mutex, MutexGuard};

use crate::{
    category::Category,
    error::RoomError,
    wait::{Deadline, WaitStage},
};

/// Binary gate every worker passes through before registering.
#[derive(Debug, Default)]
pub struct FairnessGate {
    gate: Mutex<()>,
}

impl FairnessGate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass the gate, running `register` while holding it.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Timeout` at [`WaitStage::Turnstile`] if the gate
    /// cannot be taken before the deadline, otherwise whatever `register`
    /// returns.
    pub fn pass<T>(
        &self,
        category: Category,
        deadline: Deadline,
        register: impl FnOnce() -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let guard = match deadline {
            Deadline::Never => self.gate.lock(),
            Deadline::At(at) => self
                .gate
                .try_lock_until(at)
                .ok_or(RoomError::Timeout { category, stage: WaitStage::Turnstile })?,
        };

        let result = register();
        MutexGuard::unlock_fair(guard);
        result
    }

    /// Whether some worker is inside the gate right now.
    pub fn is_held(&self) -> bool {
        self.gate.is_locked()
    }
}
