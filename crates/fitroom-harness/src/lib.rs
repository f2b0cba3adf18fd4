//! Test harness for the fitroom synchronization core.
//!
//! Runs real multi-threaded simulations with an event recorder attached and
//! checks the result against a set of invariants.
//!
//! # Invariant Testing
//!
//! Invariants verify WHAT must be true for every interleaving, not what a
//! particular schedule produced. Use [`InvariantRegistry::standard()`] for
//! the room's properties:
//!
//! - Capacity bound: occupancy never exceeds the slot count
//! - No mixing: admissions match the occupying category
//! - Ids: assigned 1, 2, 3, ... in admission order
//! - Sessions: start and empty notifications alternate
//! - Liveness: every admitted worker leaves, the room ends quiescent

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod recorder;
pub mod scenario;

pub use invariants::{
    AllDeparted, CapacityBound, IdsIncreasing, Invariant, InvariantRegistry, InvariantResult,
    NoMixing, RunTrace, SessionPairing, Violation,
};
pub use recorder::{EventRecorder, RecordedEvent};
pub use scenario::{Oracle, Scenario, ScenarioError, ScenarioOutcome};
