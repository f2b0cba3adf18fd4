//! Thread-per-worker simulation driver.
//!
//! Builds one [`Room`] per run, starts one OS thread per worker in a
//! randomized order, and joins them all before reporting.
//!
//! ## Outcomes
//!
//! - Admitted: the worker ran its occupancy action and left.
//! - Timed out: only under a bounded [`WaitPolicy`]; recorded, not fatal.
//! - Protocol violation or panic: the run is reported as failed once every
//!   thread has been joined.

use std::{iter, sync::Arc, thread, time::Duration};

use fitroom_core::{
    Category, ObserverSet, Room, RoomConfig, RoomError, RoomObserver, RoomSnapshot, WaitPolicy,
    WorkerId,
};
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::{env::Environment, error::SimError, system_env::SystemEnv};

/// Default lower bound of a worker's stay, inclusive.
pub const DEFAULT_DWELL_MIN: Duration = Duration::from_millis(50);

/// Default upper bound of a worker's stay, exclusive.
pub const DEFAULT_DWELL_MAX: Duration = Duration::from_millis(100);

/// Range a worker's stay in the room is drawn from: `[min, max)`.
///
/// `min == max` is a fixed dwell time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellRange {
    min: Duration,
    max: Duration,
}

impl DwellRange {
    /// Validate a dwell range.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidDwell` if `min > max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, SimError> {
        if min > max {
            return Err(SimError::InvalidDwell { min, max });
        }
        Ok(Self { min, max })
    }

    /// Constant dwell time.
    pub fn fixed(duration: Duration) -> Self {
        Self { min: duration, max: duration }
    }

    /// Draw a dwell time from `env`.
    pub fn sample(&self, env: &impl Environment) -> Duration {
        let span = u64::try_from((self.max - self.min).as_nanos()).unwrap_or(u64::MAX);
        self.min + Duration::from_nanos(env.random_below(span))
    }
}

impl Default for DwellRange {
    fn default() -> Self {
        Self { min: DEFAULT_DWELL_MIN, max: DEFAULT_DWELL_MAX }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Workers admitted per category (indexed by [`Category::index`]).
    pub admitted: [usize; 2],
    /// Workers that gave up per category.
    pub timed_out: [usize; 2],
    /// Highest id issued.
    pub last_id: Option<WorkerId>,
    /// Room state after every worker was joined.
    pub final_state: RoomSnapshot,
    /// Wall time from the first spawn to the last join.
    pub elapsed: Duration,
}

impl RunReport {
    /// Admitted workers of both categories.
    pub fn total_admitted(&self) -> usize {
        self.admitted.iter().sum()
    }

    /// Timed-out workers of both categories.
    pub fn total_timed_out(&self) -> usize {
        self.timed_out.iter().sum()
    }
}

/// A configured run, ready to spawn.
#[derive(Debug)]
pub struct Simulation<E: Environment = SystemEnv> {
    config: RoomConfig,
    env: E,
    observers: ObserverSet,
    wait_policy: WaitPolicy,
    dwell: DwellRange,
}

impl Simulation<SystemEnv> {
    /// Validate raw configuration and prepare a run on the system
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` if the capacity is not
    /// positive, a count is negative, or both counts are zero. Nothing has
    /// been started in that case.
    pub fn configure(
        capacity: i64,
        blue_workers: i64,
        green_workers: i64,
    ) -> Result<Self, SimError> {
        let config = RoomConfig::new(capacity, blue_workers, green_workers)?;
        Ok(Self::from_config(config))
    }

    /// Prepare a run from an already validated configuration.
    pub fn from_config(config: RoomConfig) -> Self {
        Self {
            config,
            env: SystemEnv::new(),
            observers: ObserverSet::new(),
            wait_policy: WaitPolicy::Unbounded,
            dwell: DwellRange::default(),
        }
    }
}

impl<E: Environment> Simulation<E> {
    /// Run on a different environment.
    pub fn with_env<F: Environment>(self, env: F) -> Simulation<F> {
        Simulation {
            config: self.config,
            env,
            observers: self.observers,
            wait_policy: self.wait_policy,
            dwell: self.dwell,
        }
    }

    /// Add an occupancy observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RoomObserver>) -> Self {
        self.observers = self.observers.with(observer);
        self
    }

    /// Bound how long each worker may wait to enter.
    #[must_use]
    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    /// Dwell range used by [`run`](Self::run).
    #[must_use]
    pub fn with_dwell(mut self, dwell: DwellRange) -> Self {
        self.dwell = dwell;
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Draw a randomized start order covering every worker.
    pub fn start_order(&self) -> Vec<Category> {
        let mut order: Vec<Category> = Category::ALL
            .into_iter()
            .flat_map(|category| iter::repeat_n(category, self.config.workers(category)))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.env.random_u64());
        order.shuffle(&mut rng);
        order
    }

    /// Run every worker with the default action: stay for a random dwell
    /// time drawn from the environment.
    ///
    /// # Errors
    ///
    /// See [`spawn_and_run`](Self::spawn_and_run).
    pub fn run(&self) -> Result<RunReport, SimError> {
        self.spawn_and_run(|_, _| self.env.sleep(self.dwell.sample(&self.env)))
    }

    /// Spawn one thread per worker, each entering the room, running `action`
    /// and leaving. Returns after every thread has been joined.
    ///
    /// # Errors
    ///
    /// - `SimError::Spawn` if a thread could not be started
    /// - `SimError::WorkerPanicked` if an action panicked
    /// - `SimError::Room` if a worker hit a protocol violation
    ///
    /// Timeouts are not errors; they are counted in the report.
    pub fn spawn_and_run<F>(&self, action: F) -> Result<RunReport, SimError>
    where
        F: Fn(Category, WorkerId) + Sync,
    {
        let room = Room::from_config(&self.config)
            .with_observer(Arc::new(self.observers.clone()))
            .with_wait_policy(self.wait_policy);
        let order = self.start_order();

        tracing::info!(
            capacity = self.config.capacity().get(),
            blue = self.config.workers(Category::Blue),
            green = self.config.workers(Category::Green),
            "starting run"
        );

        let started = self.env.now();
        let joined = thread::scope(|s| {
            let mut handles = Vec::with_capacity(order.len());
            let mut spawn_error = None;

            for (n, category) in order.iter().copied().enumerate() {
                let room = &room;
                let action = &action;
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", category.name().to_ascii_lowercase(), n))
                    .spawn_scoped(s, move || room.visit(category, action));

                match spawned {
                    Ok(handle) => handles.push((category, handle)),
                    Err(e) => {
                        spawn_error = Some(e);
                        break;
                    },
                }
            }

            let joined: Vec<_> = handles.into_iter().map(|(c, h)| (c, h.join())).collect();
            (joined, spawn_error)
        });
        let elapsed = self.env.now().saturating_duration_since(started);

        let (joined, spawn_error) = joined;
        if let Some(e) = spawn_error {
            return Err(SimError::Spawn(e));
        }

        let mut admitted = [0; 2];
        let mut timed_out = [0; 2];
        let mut last_id = None;

        for (category, outcome) in joined {
            match outcome {
                Ok(Ok(id)) => {
                    admitted[category.index()] += 1;
                    last_id = last_id.max(Some(id));
                },
                Ok(Err(err @ RoomError::Timeout { .. })) => {
                    tracing::warn!("{}", err);
                    timed_out[category.index()] += 1;
                },
                Ok(Err(err)) => {
                    tracing::error!("run aborted: {}", err);
                    return Err(err.into());
                },
                Err(_) => return Err(SimError::WorkerPanicked { category }),
            }
        }

        let report =
            RunReport { admitted, timed_out, last_id, final_state: room.snapshot(), elapsed };
        tracing::info!(
            admitted = report.total_admitted(),
            timed_out = report.total_timed_out(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "run complete"
        );

        Ok(report)
    }
}
