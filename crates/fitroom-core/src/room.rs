//! Room
//!
//! Composes the turnstile, lightswitches, exclusion lock and multiplexers into
//! the worker protocol.
//!
//! ## Entry order
//!
//! 1. Turnstile, held only while registering with the category gate
//! 2. Category gate (may block on the exclusion lock while still holding the
//!    turnstile, which stops every later arrival)
//! 3. Capacity permit, outside every other lock
//! 4. Room state bookkeeping and events
//!
//! ## Exit order
//!
//! 1. Permit release and occupancy decrement under the room state guard
//! 2. Category gate unregistration (may release the exclusion lock)
//!
//! Acquiring in this order is what rules out deadlock. Stopping arrivals at
//! the turnstile is what rules out starvation.

use std::{num::NonZeroUsize, sync::Arc};

use crate::{
    category::Category,
    config::RoomConfig,
    error::RoomError,
    event::{NoopObserver, RoomObserver},
    exclusion::ExclusionLock,
    lightswitch::CategoryGate,
    multiplexer::CapacityLimiter,
    state::RoomState,
    turnstile::FairnessGate,
    wait::WaitPolicy,
    worker::{WorkerId, WorkerState},
};

/// Two-category room with a fixed number of slots.
///
/// Shared by reference between worker threads. Each worker calls
/// [`enter`](Self::enter) once and [`Occupant::leave`] once, or
/// [`visit`](Self::visit) to do both around an action.
pub struct Room {
    capacity: NonZeroUsize,
    turnstile: FairnessGate,
    exclusion: ExclusionLock,
    gates: [CategoryGate; 2],
    limiters: [CapacityLimiter; 2],
    state: RoomState,
    observer: Arc<dyn RoomObserver>,
    wait_policy: WaitPolicy,
}

/// Point-in-time view of the room's primitives, for diagnostics.
///
/// Each field is read under its own guard; the snapshot as a whole is not
/// atomic while workers are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Workers inside the room.
    pub occupancy: usize,
    /// Category inside the room.
    pub occupying: Option<Category>,
    /// Ids issued so far.
    pub issued: u64,
    /// Workers registered with each category gate (indexed by
    /// [`Category::index`]).
    pub registered: [usize; 2],
    /// Permits available per category.
    pub available: [usize; 2],
    /// Category holding the exclusion lock.
    pub exclusion_holder: Option<Category>,
    /// Workers blocked on the exclusion lock.
    pub exclusion_waiters: usize,
    /// Some worker is inside the turnstile.
    pub turnstile_held: bool,
}

impl RoomSnapshot {
    /// Registered workers of `category`.
    pub fn registered(&self, category: Category) -> usize {
        self.registered[category.index()]
    }

    /// Available permits for `category`.
    pub fn available(&self, category: Category) -> usize {
        self.available[category.index()]
    }
}

impl Room {
    /// Create an empty room with `capacity` slots, no observer and unbounded
    /// waits.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let slots = capacity.get();
        Self {
            capacity,
            turnstile: FairnessGate::new(),
            exclusion: ExclusionLock::new(),
            gates: Category::ALL.map(CategoryGate::new),
            limiters: Category::ALL.map(|category| CapacityLimiter::new(category, slots)),
            state: RoomState::new(),
            observer: Arc::new(NoopObserver),
            wait_policy: WaitPolicy::Unbounded,
        }
    }

    /// Create a room sized by `config`.
    pub fn from_config(config: &RoomConfig) -> Self {
        Self::new(config.capacity())
    }

    /// Report occupancy changes to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RoomObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Default wait policy for [`enter`](Self::enter) and
    /// [`visit`](Self::visit).
    #[must_use]
    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    /// Number of slots.
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Enter the room as a worker of `category`, blocking until admitted.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Timeout` if the room's wait policy expires, and
    /// `RoomError::ProtocolViolation` if an invariant broke.
    pub fn enter(&self, category: Category) -> Result<Occupant<'_>, RoomError> {
        self.enter_within(category, self.wait_policy)
    }

    /// Enter with an explicit wait policy for this attempt.
    ///
    /// On timeout, everything acquired during the attempt is given back:
    /// a worker that registered with its category gate but found no free slot
    /// unregisters (releasing the exclusion lock if it was the only one).
    ///
    /// # Errors
    ///
    /// See [`enter`](Self::enter).
    pub fn enter_within(
        &self,
        category: Category,
        policy: WaitPolicy,
    ) -> Result<Occupant<'_>, RoomError> {
        let deadline = policy.deadline();
        let gate = self.gate(category);
        trace_state(None, category, WorkerState::Created);

        self.turnstile
            .pass(category, deadline, || gate.register_entry(&self.exclusion, deadline))?;
        trace_state(None, category, WorkerState::Queued);

        if let Err(err) = self.limiter(category).acquire(deadline) {
            gate.register_exit(&self.exclusion)?;
            tracing::debug!(%category, error = %err, "entry abandoned");
            return Err(err);
        }
        trace_state(None, category, WorkerState::Admitted);

        let admission = match self.state.on_enter(category, self.observer.as_ref()) {
            Ok(admission) => admission,
            Err(violation) => {
                // Undo the permit and registration taken above.
                self.limiter(category).release()?;
                gate.register_exit(&self.exclusion)?;
                tracing::error!(%category, "entry rejected: {}", violation);
                return Err(violation.into());
            },
        };
        tracing::debug!(
            worker = %admission.id,
            %category,
            first = admission.first_occupant,
            "worker admitted"
        );
        trace_state(Some(admission.id), category, WorkerState::Occupying);

        Ok(Occupant { room: self, id: admission.id, category, departed: false })
    }

    /// Run the whole protocol for one worker: enter, run `action`, leave.
    ///
    /// If `action` panics the worker still leaves while unwinding.
    ///
    /// # Errors
    ///
    /// See [`enter`](Self::enter). A failure to leave is a protocol
    /// violation.
    pub fn visit<F>(&self, category: Category, action: F) -> Result<WorkerId, RoomError>
    where
        F: FnOnce(Category, WorkerId),
    {
        let occupant = self.enter(category)?;
        let id = occupant.id();
        action(category, id);
        occupant.leave()?;
        Ok(id)
    }

    /// Current state of every primitive.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            occupancy: self.state.occupancy(),
            occupying: self.state.occupying(),
            issued: self.state.issued(),
            registered: self.gates.each_ref().map(CategoryGate::count),
            available: self.limiters.each_ref().map(CapacityLimiter::available),
            exclusion_holder: self.exclusion.holder(),
            exclusion_waiters: self.exclusion.waiters(),
            turnstile_held: self.turnstile.is_held(),
        }
    }

    fn depart(&self, id: WorkerId, category: Category) -> Result<(), RoomError> {
        let departure =
            self.state.on_exit(id, category, self.limiter(category), self.observer.as_ref())?;
        self.gate(category).register_exit(&self.exclusion)?;

        tracing::debug!(
            worker = %id,
            %category,
            remaining = departure.remaining,
            "worker departed"
        );
        trace_state(Some(id), category, WorkerState::Departed);
        Ok(())
    }

    fn gate(&self, category: Category) -> &CategoryGate {
        &self.gates[category.index()]
    }

    fn limiter(&self, category: Category) -> &CapacityLimiter {
        &self.limiters[category.index()]
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("capacity", &self.capacity)
            .field("wait_policy", &self.wait_policy)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

fn trace_state(id: Option<WorkerId>, category: Category, state: WorkerState) {
    match id {
        Some(id) => tracing::trace!(worker = %id, %category, %state, "transition"),
        None => tracing::trace!(%category, %state, "transition"),
    }
}

/// A worker inside the room.
///
/// Proof of a successful [`Room::enter`]. Leaving consumes it, so a leave
/// without a matching enter cannot be written. Dropping it without calling
/// [`leave`](Self::leave) leaves implicitly and logs any error.
#[must_use = "dropping an occupant leaves the room immediately"]
pub struct Occupant<'room> {
    room: &'room Room,
    id: WorkerId,
    category: Category,
    departed: bool,
}

impl Occupant<'_> {
    /// Id assigned on entry.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Category of this worker.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Leave the room.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::ProtocolViolation` if the room's bookkeeping no
    /// longer matches this occupant.
    pub fn leave(mut self) -> Result<(), RoomError> {
        self.departed = true;
        self.room.depart(self.id, self.category)
    }
}

impl Drop for Occupant<'_> {
    fn drop(&mut self) {
        if self.departed {
            return;
        }

        self.departed = true;
        if let Err(err) = self.room.depart(self.id, self.category) {
            tracing::error!(
                worker = %self.id,
                category = %self.category,
                "implicit leave failed: {}",
                err
            );
        }
    }
}

impl std::fmt::Debug for Occupant<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Occupant").field("id", &self.id).field("category", &self.category).finish()
    }
}
