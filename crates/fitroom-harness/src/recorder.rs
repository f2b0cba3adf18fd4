//! Event recording.
//!
//! Observers run inside the room's state guard, so the recorder cannot ask
//! the room for a snapshot while recording. Instead it replays occupancy from
//! the events themselves; since events are emitted in occupancy order, the
//! replayed value equals the room's occupancy at emission time.

use fitroom_core::{Category, RoomEvent, RoomObserver, WorkerId};
use parking_lot::Mutex;

/// One observed event with its position in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Global sequence number, starting at 0.
    pub seq: u64,
    /// The event.
    pub event: RoomEvent,
    /// Occupants after the event was applied.
    pub occupancy: usize,
    /// Category occupying after the event was applied.
    pub occupying: Option<Category>,
}

#[derive(Debug, Default)]
struct RecorderState {
    next_seq: u64,
    occupancy: usize,
    occupying: Option<Category>,
    events: Vec<RecordedEvent>,
}

impl RecorderState {
    fn record(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::SessionStarted { category } => self.occupying = Some(category),
            RoomEvent::WorkerAdmitted { .. } => self.occupancy += 1,
            RoomEvent::WorkerDeparted { .. } => {
                // An unmatched departure is reported by the invariants; keep
                // replaying.
                self.occupancy = self.occupancy.saturating_sub(1);
            },
            RoomEvent::RoomEmptied => self.occupying = None,
        }

        self.events.push(RecordedEvent {
            seq: self.next_seq,
            event,
            occupancy: self.occupancy,
            occupying: self.occupying,
        });
        self.next_seq += 1;
    }
}

/// Observer recording every event of a run.
#[derive(Debug, Default)]
pub struct EventRecorder {
    state: Mutex<RecorderState>,
}

impl EventRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.state.lock().events.clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest replayed occupancy.
    pub fn peak_occupancy(&self) -> usize {
        self.state.lock().events.iter().map(|e| e.occupancy).max().unwrap_or(0)
    }
}

impl RoomObserver for EventRecorder {
    fn on_session_start(&self, category: Category) {
        self.state.lock().record(RoomEvent::SessionStarted { category });
    }

    fn on_worker_admitted(&self, id: WorkerId, category: Category) {
        self.state.lock().record(RoomEvent::WorkerAdmitted { id, category });
    }

    fn on_worker_departed(&self, id: WorkerId, category: Category) {
        self.state.lock().record(RoomEvent::WorkerDeparted { id, category });
    }

    fn on_room_empty(&self) {
        self.state.lock().record(RoomEvent::RoomEmptied);
    }
}
