//! Scenario builder.
//!
//! A scenario configures one run, executes it on real threads with an
//! [`EventRecorder`] attached, checks the invariant registry over the
//! recorded trace and finally hands the outcome to an optional oracle.
//!
//! ```rust,ignore
//! let outcome = Scenario::new()
//!     .with_capacity(2)
//!     .with_workers(3, 3)
//!     .with_seed(7)
//!     .oracle(Box::new(|outcome| {
//!         if outcome.report.total_admitted() == 6 { Ok(()) } else { Err("lost".into()) }
//!     }))
//!     .run()?;
//! ```

use std::{sync::Arc, time::Duration};

use fitroom_core::{RoomObserver, WaitPolicy};
use fitroom_sim::{DwellRange, RunReport, SeededEnv, SimError, Simulation};
use thiserror::Error;

use crate::{
    invariants::{InvariantRegistry, RunTrace, Violation},
    recorder::EventRecorder,
};

/// Custom check run after the invariants pass.
pub type Oracle = Box<dyn FnOnce(&ScenarioOutcome) -> Result<(), String>>;

/// Why a scenario failed.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The driver rejected the configuration or aborted the run.
    #[error("simulation failed: {0}")]
    Sim(#[from] SimError),

    /// One or more invariants did not hold.
    #[error("{} invariant(s) violated: {}", .0.len(), render(.0))]
    InvariantsViolated(Vec<Violation>),

    /// The oracle rejected the outcome.
    #[error("oracle failed: {0}")]
    Oracle(String),
}

fn render(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// What a successful scenario produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// Driver report.
    pub report: RunReport,
    /// Recorded trace the invariants were checked against.
    pub trace: RunTrace,
}

/// Builder for a single checked run.
pub struct Scenario {
    capacity: i64,
    workers: (i64, i64),
    seed: Option<u64>,
    dwell: DwellRange,
    wait_policy: WaitPolicy,
    invariants: InvariantRegistry,
    oracle: Option<Oracle>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Two slots, two workers of each category, 1ms dwell, standard
    /// invariants.
    pub fn new() -> Self {
        Self {
            capacity: 2,
            workers: (2, 2),
            seed: None,
            dwell: DwellRange::fixed(Duration::from_millis(1)),
            wait_policy: WaitPolicy::Unbounded,
            invariants: InvariantRegistry::standard(),
            oracle: None,
        }
    }

    /// Room capacity (validated at run time).
    #[must_use]
    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Worker counts (validated at run time).
    #[must_use]
    pub fn with_workers(mut self, blue: i64, green: i64) -> Self {
        self.workers = (blue, green);
        self
    }

    /// Seed start order and dwell times.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Dwell range for every worker.
    #[must_use]
    pub fn with_dwell(mut self, dwell: DwellRange) -> Self {
        self.dwell = dwell;
        self
    }

    /// Bound entry waits.
    #[must_use]
    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    /// Replace the invariant registry.
    #[must_use]
    pub fn with_invariants(mut self, invariants: InvariantRegistry) -> Self {
        self.invariants = invariants;
        self
    }

    /// Custom check over the outcome.
    #[must_use]
    pub fn oracle(mut self, oracle: Oracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Execute the run, then check invariants and the oracle.
    pub fn run(self) -> Result<ScenarioOutcome, ScenarioError> {
        let recorder = Arc::new(EventRecorder::new());
        let observer: Arc<dyn RoomObserver> = recorder.clone();

        let (blue, green) = self.workers;
        let sim = Simulation::configure(self.capacity, blue, green)?
            .with_observer(observer)
            .with_wait_policy(self.wait_policy)
            .with_dwell(self.dwell);
        let capacity = sim.config().capacity().get();

        let report = match self.seed {
            Some(seed) => sim.with_env(SeededEnv::with_seed(seed)).run()?,
            None => sim.run()?,
        };

        let trace = RunTrace {
            capacity,
            admitted: report.total_admitted(),
            events: recorder.events(),
            final_state: report.final_state,
        };
        tracing::debug!(
            events = trace.events.len(),
            peak = recorder.peak_occupancy(),
            "scenario recorded"
        );

        if let Err(violations) = self.invariants.check_all(&trace) {
            for v in &violations {
                tracing::warn!("{}", v);
            }
            return Err(ScenarioError::InvariantsViolated(violations));
        }

        let outcome = ScenarioOutcome { report, trace };
        if let Some(oracle) = self.oracle {
            oracle(&outcome).map_err(ScenarioError::Oracle)?;
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("capacity", &self.capacity)
            .field("workers", &self.workers)
            .field("seed", &self.seed)
            .field("dwell", &self.dwell)
            .field("wait_policy", &self.wait_policy)
            .field("invariants", &self.invariants)
            .field("oracle", &self.oracle.is_some())
            .finish()
    }
}
