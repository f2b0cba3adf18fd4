//! Cross-category exclusion lock.
//!
//! A binary lock whose holder is a category, not a thread: the first worker of
//! a category acquires it and the last one of that category releases it,
//! typically from a different thread. It has no fairness of its own; the
//! turnstile supplies that.

use parking_lot::{Condvar, Mutex};

use crate::{
    category::Category,
    error::{RoomError, Violation},
    wait::{Deadline, WaitStage},
};

#[derive(Debug, Default)]
struct ExclusionState {
    holder: Option<Category>,
    waiters: usize,
}

/// Binary lock held by whichever category currently occupies the room.
#[derive(Debug, Default)]
pub struct ExclusionLock {
    state: Mutex<ExclusionState>,
    released: Condvar,
}

impl ExclusionLock {
    /// Create a free lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire on behalf of `category`, blocking while the lock is held.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Timeout` at [`WaitStage::Exclusion`] if the deadline
    /// passes first. The lock is not held in that case.
    pub fn acquire(&self, category: Category, deadline: Deadline) -> Result<(), RoomError> {
        let mut state = self.state.lock();

        if state.holder.is_some() {
            state.waiters += 1;
            tracing::trace!(%category, holder = ?state.holder, "waiting for exclusion lock");

            while state.holder.is_some() {
                if !deadline.wait(&self.released, &mut state) && state.holder.is_some() {
                    state.waiters -= 1;
                    return Err(RoomError::Timeout { category, stage: WaitStage::Exclusion });
                }
            }

            state.waiters -= 1;
        }

        state.holder = Some(category);
        tracing::trace!(%category, "exclusion lock acquired");
        Ok(())
    }

    /// Release on behalf of `category`.
    ///
    /// # Errors
    ///
    /// Returns `Violation::ForeignRelease` if `category` does not hold the
    /// lock. The lock is left untouched.
    pub fn release(&self, category: Category) -> Result<(), Violation> {
        let mut state = self.state.lock();
        if state.holder != Some(category) {
            return Err(Violation::ForeignRelease { releaser: category, holder: state.holder });
        }

        state.holder = None;
        drop(state);

        self.released.notify_one();
        tracing::trace!(%category, "exclusion lock released");
        Ok(())
    }

    /// Category currently holding the lock.
    pub fn holder(&self) -> Option<Category> {
        self.state.lock().holder
    }

    /// Number of workers blocked in [`acquire`](Self::acquire).
    pub fn waiters(&self) -> usize {
        self.state.lock().waiters
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

    #[test]
    fn acquire_free_lock_records_holder() {
        let lock = ExclusionLock::new();
        lock.acquire(Category::Blue, Deadline::Never).unwrap();
        assert_eq!(lock.holder(), Some(Category::Blue));

        lock.release(Category::Blue).unwrap();
        assert_eq!(lock.holder(), None);
    }

    #[test]
    fn release_by_other_category_is_violation() {
        let lock = ExclusionLock::new();
        lock.acquire(Category::Blue, Deadline::Never).unwrap();

        let result = lock.release(Category::Green);
        assert_eq!(
            result,
            Err(Violation::ForeignRelease {
                releaser: Category::Green,
                holder: Some(Category::Blue)
            })
        );
        assert_eq!(lock.holder(), Some(Category::Blue));
    }

    #[test]
    fn release_of_free_lock_is_violation() {
        let lock = ExclusionLock::new();
        assert!(lock.release(Category::Blue).is_err());
    }

    #[test]
    fn acquire_times_out_while_held() {
        let lock = ExclusionLock::new();
        lock.acquire(Category::Blue, Deadline::Never).unwrap();

        let deadline = Deadline::At(Instant::now() + Duration::from_millis(20));
        let result = lock.acquire(Category::Green, deadline);

        assert_eq!(
            result,
            Err(RoomError::Timeout { category: Category::Green, stage: WaitStage::Exclusion })
        );
        assert_eq!(lock.holder(), Some(Category::Blue));
        assert_eq!(lock.waiters(), 0);
    }

    #[test]
    fn release_hands_lock_to_waiter() {
        let lock = Arc::new(ExclusionLock::new());
        lock.acquire(Category::Blue, Deadline::Never).unwrap();

        let waiter = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.acquire(Category::Green, Deadline::Never))
        };

        while lock.waiters() == 0 {
            thread::yield_now();
        }

        lock.release(Category::Blue).unwrap();
        waiter.join().unwrap().unwrap();
        assert_eq!(lock.holder(), Some(Category::Green));
    }
}
