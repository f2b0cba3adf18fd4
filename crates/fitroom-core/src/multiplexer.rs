//! Multiplexer: bounded permit pool for one category.
//!
//! Acquired outside the turnstile and outside the room state guard, so a
//! worker blocked here never holds a lock someone else needs to free a slot.

use parking_lot::{Condvar, Mutex};

use crate::{
    category::Category,
    error::{RoomError, Violation},
    wait::{Deadline, WaitStage},
};

/// Counting semaphore sized to the room capacity.
#[derive(Debug)]
pub struct CapacityLimiter {
    category: Category,
    capacity: usize,
    available: Mutex<usize>,
    freed: Condvar,
}

impl CapacityLimiter {
    /// Create a limiter with all `capacity` permits available.
    pub fn new(category: Category, capacity: usize) -> Self {
        Self { category, capacity, available: Mutex::new(capacity), freed: Condvar::new() }
    }

    /// Take one permit, blocking while none are available.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Timeout` at [`WaitStage::Capacity`] if the deadline
    /// passes first. No permit is taken in that case.
    pub fn acquire(&self, deadline: Deadline) -> Result<(), RoomError> {
        let mut available = self.available.lock();

        while *available == 0 {
            if !deadline.wait(&self.freed, &mut available) && *available == 0 {
                return Err(RoomError::Timeout {
                    category: self.category,
                    stage: WaitStage::Capacity,
                });
            }
        }

        *available -= 1;
        Ok(())
    }

    /// Return one permit, waking at most one waiter.
    ///
    /// Never blocks beyond the internal guard, so it is safe to call while
    /// holding the room state guard.
    ///
    /// # Errors
    ///
    /// Returns `Violation::PermitOverflow` if every permit is already back.
    pub fn release(&self) -> Result<(), Violation> {
        let mut available = self.available.lock();
        if *available >= self.capacity {
            return Err(Violation::PermitOverflow {
                category: self.category,
                capacity: self.capacity,
            });
        }

        *available += 1;
        drop(available);

        self.freed.notify_one();
        Ok(())
    }

    /// Permits currently available.
    pub fn available(&self) -> usize {
        *self.available.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    fn soon() -> Deadline {
        Deadline::At(Instant::now() + Duration::from_millis(20))
    }

    #[test]
    fn acquire_until_exhausted() {
        let limiter = CapacityLimiter::new(Category::Blue, 2);
        limiter.acquire(Deadline::Never).unwrap();
        limiter.acquire(Deadline::Never).unwrap();
        assert_eq!(limiter.available(), 0);

        assert_eq!(
            limiter.acquire(soon()),
            Err(RoomError::Timeout { category: Category::Blue, stage: WaitStage::Capacity })
        );
    }

    #[test]
    fn release_beyond_capacity_is_violation() {
        let limiter = CapacityLimiter::new(Category::Green, 1);
        assert_eq!(
            limiter.release(),
            Err(Violation::PermitOverflow { category: Category::Green, capacity: 1 })
        );
        assert_eq!(limiter.available(), 1);
    }

    #[test]
    fn release_wakes_blocked_acquirer() {
        let limiter = Arc::new(CapacityLimiter::new(Category::Blue, 1));
        limiter.acquire(Deadline::Never).unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || limiter.acquire(Deadline::Never))
        };

        thread::sleep(Duration::from_millis(10));
        limiter.release().unwrap();

        waiter.join().unwrap().unwrap();
        assert_eq!(limiter.available(), 0);
    }
}
