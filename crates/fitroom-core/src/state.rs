//! Shared occupancy bookkeeping.
//!
//! Every mutation runs under one guard held only for O(1) work, never across
//! a blocking wait. Observer callbacks fire inside the same guard, so the
//! event stream is a faithful linearization of occupancy.

use parking_lot::Mutex;

use crate::{
    category::Category,
    error::Violation,
    event::RoomObserver,
    multiplexer::CapacityLimiter,
    worker::WorkerId,
};

#[derive(Debug, Default)]
struct Counters {
    occupancy: usize,
    last_id: u64,
    occupying: Option<Category>,
}

/// Outcome of [`RoomState::on_enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Id assigned to the entering worker.
    pub id: WorkerId,
    /// The room was empty before this worker entered.
    pub first_occupant: bool,
}

/// Outcome of [`RoomState::on_exit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// Occupancy after the exit.
    pub remaining: usize,
    /// The room is now empty.
    pub became_empty: bool,
}

/// Room occupancy, id counter and event emission.
#[derive(Debug, Default)]
pub struct RoomState {
    counters: Mutex<Counters>,
}

impl RoomState {
    /// Empty room, no ids issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a worker of `category` entering.
    ///
    /// Assigns the next id and bumps occupancy. Emits session-start when the
    /// room was empty, then worker-admitted.
    ///
    /// # Errors
    ///
    /// Returns `Violation::MixedOccupancy` if the other category is inside.
    /// Nothing is recorded in that case.
    pub fn on_enter(
        &self,
        category: Category,
        observer: &dyn RoomObserver,
    ) -> Result<Admission, Violation> {
        let mut counters = self.counters.lock();

        if let Some(occupying) = counters.occupying.filter(|c| *c != category) {
            return Err(Violation::MixedOccupancy { entering: category, occupying });
        }

        counters.last_id += 1;
        let id = WorkerId(counters.last_id);
        let first_occupant = counters.occupancy == 0;
        counters.occupancy += 1;
        counters.occupying = Some(category);

        if first_occupant {
            observer.on_session_start(category);
        }
        observer.on_worker_admitted(id, category);

        Ok(Admission { id, first_occupant })
    }

    /// Record worker `id` leaving and hand its permit back to `limiter`.
    ///
    /// The permit goes back before occupancy drops, both under the guard. A
    /// worker woken by the permit still has to take this guard to enter, so
    /// it can never observe the old occupancy. Emits worker-departed, then
    /// room-empty if it was the last occupant.
    ///
    /// # Errors
    ///
    /// Returns `Violation::NegativeOccupancy` if the room is already empty, or
    /// the limiter's violation if its permits are all back.
    pub fn on_exit(
        &self,
        id: WorkerId,
        category: Category,
        limiter: &CapacityLimiter,
        observer: &dyn RoomObserver,
    ) -> Result<Departure, Violation> {
        let mut counters = self.counters.lock();

        if counters.occupancy == 0 {
            return Err(Violation::NegativeOccupancy { id });
        }

        limiter.release()?;
        counters.occupancy -= 1;

        let became_empty = counters.occupancy == 0;
        if became_empty {
            counters.occupying = None;
        }

        observer.on_worker_departed(id, category);
        if became_empty {
            observer.on_room_empty();
        }

        Ok(Departure { remaining: counters.occupancy, became_empty })
    }

    /// Current number of occupants.
    pub fn occupancy(&self) -> usize {
        self.counters.lock().occupancy
    }

    /// Category inside the room, if any.
    pub fn occupying(&self) -> Option<Category> {
        self.counters.lock().occupying
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u64 {
        self.counters.lock().last_id
    }
}
