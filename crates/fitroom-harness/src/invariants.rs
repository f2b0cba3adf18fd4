//! Invariants over a recorded run.
//!
//! Each invariant inspects the full event stream plus the final room state
//! and reports what must hold regardless of scheduling. Use
//! [`InvariantRegistry::standard()`] for the room's safety and liveness
//! properties.

use std::collections::HashMap;

use fitroom_core::{Category, RoomEvent, RoomSnapshot, WorkerId};

use crate::recorder::RecordedEvent;

/// Everything an invariant may look at.
#[derive(Debug, Clone)]
pub struct RunTrace {
    /// Room capacity.
    pub capacity: usize,
    /// Workers the driver reports as admitted.
    pub admitted: usize,
    /// Recorded events in emission order.
    pub events: Vec<RecordedEvent>,
    /// Room state after every worker was joined.
    pub final_state: RoomSnapshot,
}

/// A failed invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the invariant.
    pub invariant: &'static str,
    /// What went wrong.
    pub message: String,
    /// Sequence number of the offending event, if any.
    pub seq: Option<u64>,
}

impl Violation {
    fn at(invariant: &'static str, seq: u64, message: impl Into<String>) -> Self {
        Self { invariant, message: message.into(), seq: Some(seq) }
    }

    fn final_state(invariant: &'static str, message: impl Into<String>) -> Self {
        Self { invariant, message: message.into(), seq: None }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.seq {
            Some(seq) => write!(f, "[{}] at event {}: {}", self.invariant, seq, self.message),
            None => write!(f, "[{}] {}", self.invariant, self.message),
        }
    }
}

/// Outcome of a single invariant check.
pub type InvariantResult = Result<(), Violation>;

/// A property every run must satisfy.
pub trait Invariant: Send + Sync {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Check the trace.
    fn check(&self, trace: &RunTrace) -> InvariantResult;
}

/// Occupancy never exceeds capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityBound;

impl Invariant for CapacityBound {
    fn name(&self) -> &'static str {
        "capacity_bound"
    }

    fn check(&self, trace: &RunTrace) -> InvariantResult {
        match trace.events.iter().find(|e| e.occupancy > trace.capacity) {
            Some(e) => Err(Violation::at(
                self.name(),
                e.seq,
                format!("occupancy {} exceeds capacity {}", e.occupancy, trace.capacity),
            )),
            None => Ok(()),
        }
    }
}

/// Every admission matches the category of the current session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMixing;

impl Invariant for NoMixing {
    fn name(&self) -> &'static str {
        "no_mixing"
    }

    fn check(&self, trace: &RunTrace) -> InvariantResult {
        let mut session: Option<Category> = None;

        for e in &trace.events {
            match e.event {
                RoomEvent::SessionStarted { category } => session = Some(category),
                RoomEvent::WorkerAdmitted { id, category } if session != Some(category) => {
                    let occupying = session.map_or("nobody".to_string(), |c| c.to_string());
                    return Err(Violation::at(
                        self.name(),
                        e.seq,
                        format!("{category} worker {id} admitted while {occupying} occupies"),
                    ));
                },
                RoomEvent::RoomEmptied => session = None,
                _ => {},
            }
        }

        Ok(())
    }
}

/// Ids are assigned 1, 2, 3, ... in admission order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdsIncreasing;

impl Invariant for IdsIncreasing {
    fn name(&self) -> &'static str {
        "ids_increasing"
    }

    fn check(&self, trace: &RunTrace) -> InvariantResult {
        let mut expected = 1;

        for e in &trace.events {
            if let RoomEvent::WorkerAdmitted { id, .. } = e.event {
                if id != WorkerId(expected) {
                    return Err(Violation::at(
                        self.name(),
                        e.seq,
                        format!("expected id {expected}, got {id}"),
                    ));
                }
                expected += 1;
            }
        }

        Ok(())
    }
}

/// Session starts and room-empty notifications alternate, each at the right
/// occupancy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPairing;

impl Invariant for SessionPairing {
    fn name(&self) -> &'static str {
        "session_pairing"
    }

    fn check(&self, trace: &RunTrace) -> InvariantResult {
        let mut open = false;
        let mut previous_occupancy = 0;

        for e in &trace.events {
            match e.event {
                RoomEvent::SessionStarted { .. } => {
                    if open || previous_occupancy != 0 {
                        return Err(Violation::at(
                            self.name(),
                            e.seq,
                            "session started while the room was occupied",
                        ));
                    }
                    open = true;
                },
                RoomEvent::RoomEmptied => {
                    if !open || e.occupancy != 0 {
                        return Err(Violation::at(
                            self.name(),
                            e.seq,
                            "room reported empty while occupied or outside a session",
                        ));
                    }
                    open = false;
                },
                RoomEvent::WorkerAdmitted { .. } if !open => {
                    return Err(Violation::at(self.name(), e.seq, "admission outside a session"));
                },
                _ => {},
            }
            previous_occupancy = e.occupancy;
        }

        if open {
            return Err(Violation::final_state(self.name(), "last session never emptied"));
        }

        Ok(())
    }
}

/// Every admitted worker departs exactly once and the room ends quiescent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllDeparted;

impl Invariant for AllDeparted {
    fn name(&self) -> &'static str {
        "all_departed"
    }

    fn check(&self, trace: &RunTrace) -> InvariantResult {
        let mut inside: HashMap<WorkerId, Category> = HashMap::new();
        let mut admitted = 0;

        for e in &trace.events {
            match e.event {
                RoomEvent::WorkerAdmitted { id, category } => {
                    admitted += 1;
                    inside.insert(id, category);
                },
                RoomEvent::WorkerDeparted { id, category } => {
                    if inside.remove(&id) != Some(category) {
                        return Err(Violation::at(
                            self.name(),
                            e.seq,
                            format!("{category} worker {id} departed without being inside"),
                        ));
                    }
                },
                _ => {},
            }
        }

        if admitted != trace.admitted {
            return Err(Violation::final_state(
                self.name(),
                format!("{admitted} admissions recorded, driver reports {}", trace.admitted),
            ));
        }
        if let Some(id) = inside.keys().min() {
            return Err(Violation::final_state(self.name(), format!("worker {id} never left")));
        }

        let s = &trace.final_state;
        let quiescent = s.occupancy == 0
            && s.occupying.is_none()
            && s.registered == [0, 0]
            && s.available == [trace.capacity; 2]
            && s.exclusion_holder.is_none()
            && s.exclusion_waiters == 0
            && !s.turnstile_held;
        if !quiescent {
            return Err(Violation::final_state(
                self.name(),
                format!("room not quiescent after run: {s:?}"),
            ));
        }

        Ok(())
    }
}

/// Ordered set of invariants checked together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity bound, no mixing, increasing ids, session pairing and all
    /// departed.
    pub fn standard() -> Self {
        Self::new()
            .with(CapacityBound)
            .with(NoMixing)
            .with(IdsIncreasing)
            .with(SessionPairing)
            .with(AllDeparted)
    }

    /// Add an invariant.
    #[must_use]
    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.invariants.push(Box::new(invariant));
        self
    }

    /// Names of the registered invariants, in check order.
    pub fn names(&self) -> Vec<&'static str> {
        self.invariants.iter().map(|i| i.name()).collect()
    }

    /// Check every invariant, collecting all violations.
    pub fn check_all(&self, trace: &RunTrace) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.invariants.iter().filter_map(|i| i.check(trace).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

impl std::fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvariantRegistry").field("invariants", &self.names()).finish()
    }
}
