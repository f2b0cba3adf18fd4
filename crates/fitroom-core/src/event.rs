//! Occupancy-change notifications.
//!
//! Observers are invoked synchronously from inside the room state guard, so
//! the order in which they see events is the order occupancy changed.
//! Implementations must not block and must not call back into the room.

use std::sync::Arc;

use crate::{category::Category, worker::WorkerId};

/// Receives occupancy changes from a [`Room`](crate::Room).
///
/// All methods default to no-ops.
pub trait RoomObserver: Send + Sync {
    /// The room went from empty to occupied by `category`.
    fn on_session_start(&self, _category: Category) {}

    /// A worker entered and was assigned `id`.
    fn on_worker_admitted(&self, _id: WorkerId, _category: Category) {}

    /// A worker left the room.
    fn on_worker_departed(&self, _id: WorkerId, _category: Category) {}

    /// The last occupant left.
    fn on_room_empty(&self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RoomObserver for NoopObserver {}

impl<T: RoomObserver + ?Sized> RoomObserver for Arc<T> {
    fn on_session_start(&self, category: Category) {
        (**self).on_session_start(category);
    }

    fn on_worker_admitted(&self, id: WorkerId, category: Category) {
        (**self).on_worker_admitted(id, category);
    }

    fn on_worker_departed(&self, id: WorkerId, category: Category) {
        (**self).on_worker_departed(id, category);
    }

    fn on_room_empty(&self) {
        (**self).on_room_empty();
    }
}

/// A single occupancy change, as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomEvent {
    /// Empty room became occupied by this category.
    SessionStarted {
        /// Category now occupying.
        category: Category,
    },
    /// Worker admitted into the room.
    WorkerAdmitted {
        /// Assigned id.
        id: WorkerId,
        /// Worker category.
        category: Category,
    },
    /// Worker left the room.
    WorkerDeparted {
        /// Id assigned on entry.
        id: WorkerId,
        /// Worker category.
        category: Category,
    },
    /// Room became empty.
    RoomEmptied,
}

impl RoomEvent {
    /// Deliver this event to `observer`.
    pub fn dispatch(self, observer: &dyn RoomObserver) {
        match self {
            Self::SessionStarted { category } => observer.on_session_start(category),
            Self::WorkerAdmitted { id, category } => observer.on_worker_admitted(id, category),
            Self::WorkerDeparted { id, category } => observer.on_worker_departed(id, category),
            Self::RoomEmptied => observer.on_room_empty(),
        }
    }
}

/// Fans every event out to several observers, in insertion order.
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RoomObserver>>,
}

impl ObserverSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn RoomObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether the set has no observers.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn each(&self, event: RoomEvent) {
        for observer in &self.observers {
            event.dispatch(observer.as_ref());
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet").field("observers", &self.observers.len()).finish()
    }
}

impl RoomObserver for ObserverSet {
    fn on_session_start(&self, category: Category) {
        self.each(RoomEvent::SessionStarted { category });
    }

    fn on_worker_admitted(&self, id: WorkerId, category: Category) {
        self.each(RoomEvent::WorkerAdmitted { id, category });
    }

    fn on_worker_departed(&self, id: WorkerId, category: Category) {
        self.each(RoomEvent::WorkerDeparted { id, category });
    }

    fn on_room_empty(&self) {
        self.each(RoomEvent::RoomEmptied);
    }
}
