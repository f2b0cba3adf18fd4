//! Lightswitch: per-category occupancy registration.
//!
//! Same-category workers overlap freely. The first one in turns the light on
//! (acquires the [`ExclusionLock`]), the last one out turns it off.
//!
//! # Invariants
//!
//! - `count == 0` iff the exclusion lock is not held for this category.
//! - Only the worker moving `count` 0→1 or 1→0 touches the exclusion lock.

use parking_lot::Mutex;

use crate::{
    category::Category,
    error::{RoomError, Violation},
    exclusion::ExclusionLock,
    wait::Deadline,
};

/// Counts workers of one category between registration and departure.
#[derive(Debug)]
pub struct CategoryGate {
    category: Category,
    count: Mutex<usize>,
}

impl CategoryGate {
    /// Create an empty gate for `category`.
    pub fn new(category: Category) -> Self {
        Self { category, count: Mutex::new(0) }
    }

    /// Register one more worker of this category.
    ///
    /// The first worker blocks until it acquires `exclusion`, and keeps the
    /// gate's guard while doing so: a second same-category worker must not
    /// see a non-zero count before the lock is actually held. Later workers
    /// only increment.
    ///
    /// # Errors
    ///
    /// Propagates a timeout from the exclusion lock. The count is unchanged
    /// in that case.
    pub fn register_entry(
        &self,
        exclusion: &ExclusionLock,
        deadline: Deadline,
    ) -> Result<(), RoomError> {
        let mut count = self.count.lock();

        if *count == 0 {
            exclusion.acquire(self.category, deadline)?;
            tracing::debug!(category = %self.category, "first in, room claimed");
        }

        *count += 1;
        Ok(())
    }

    /// Unregister one worker of this category, releasing `exclusion` if it
    /// was the last.
    ///
    /// # Errors
    ///
    /// Returns `Violation::UnmatchedExit` if nobody is registered.
    pub fn register_exit(&self, exclusion: &ExclusionLock) -> Result<(), Violation> {
        let mut count = self.count.lock();

        if *count == 0 {
            return Err(Violation::UnmatchedExit { category: self.category });
        }

        *count -= 1;

        if *count == 0 {
            exclusion.release(self.category)?;
            tracing::debug!(category = %self.category, "last out, room released");
        }

        Ok(())
    }

    /// Workers currently registered.
    pub fn count(&self) -> usize {
        *self.count.lock()
    }
}
