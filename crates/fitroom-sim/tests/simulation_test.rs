//! Driver integration tests
//!
//! Full runs on real threads with short dwell times.

use std::{io, sync::Arc, time::Duration};

use fitroom_core::{Category, ConfigError, RoomObserver, WaitPolicy, WorkerId};
use fitroom_sim::{ConsoleRenderer, DwellRange, Environment, SeededEnv, SimError, Simulation};
use parking_lot::Mutex;
use proptest::prelude::*;

/// Shared buffer so the transcript can be read back after the run.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

fn tiny_dwell() -> DwellRange {
    DwellRange::new(Duration::from_millis(1), Duration::from_millis(3)).unwrap()
}

#[test]
fn empty_run_is_rejected_before_any_worker() {
    let result = Simulation::configure(1, 0, 0);
    assert!(matches!(result, Err(SimError::InvalidConfiguration(ConfigError::NoWorkers))));
}

#[test]
fn non_positive_capacity_is_rejected() {
    let result = Simulation::configure(0, 1, 1);
    assert!(matches!(
        result,
        Err(SimError::InvalidConfiguration(ConfigError::NonPositiveCapacity(0)))
    ));
}

#[test]
fn run_admits_every_worker() {
    let sim = Simulation::configure(2, 3, 3)
        .unwrap()
        .with_env(SeededEnv::with_seed(5))
        .with_dwell(tiny_dwell());

    let report = sim.run().unwrap();

    assert_eq!(report.admitted, [3, 3]);
    assert_eq!(report.total_timed_out(), 0);
    assert_eq!(report.last_id, Some(WorkerId(6)));
    assert_eq!(report.final_state.occupancy, 0);
    assert_eq!(report.final_state.exclusion_holder, None);
    assert_eq!(report.final_state.available, [2, 2]);
}

#[test]
fn spawn_and_run_passes_id_and_category_to_action() {
    let seen = Mutex::new(Vec::new());
    let sim = Simulation::configure(1, 2, 1).unwrap().with_env(SeededEnv::with_seed(1));

    let report = sim.spawn_and_run(|category, id| seen.lock().push((category, id))).unwrap();
    assert_eq!(report.total_admitted(), 3);

    let mut seen = seen.into_inner();
    seen.sort_by_key(|(_, id)| *id);
    let ids: Vec<u64> = seen.iter().map(|(_, id)| id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(seen.iter().filter(|(c, _)| *c == Category::Blue).count(), 2);
}

#[test]
fn single_worker_transcript() {
    let buf = SharedBuf::default();
    let renderer: Arc<dyn RoomObserver> = Arc::new(ConsoleRenderer::new(buf.clone()));
    let sim = Simulation::configure(1, 1, 0)
        .unwrap()
        .with_observer(renderer)
        .with_dwell(tiny_dwell());

    sim.run().unwrap();

    assert_eq!(
        buf.text(),
        "----- Blue Only -----\n\n\
         Thread ID: 1\nColor: Blue\n\n\
         Thread 1 exits the fitting room.\n\n\
         >> Empty Fitting Room\n\n"
    );
}

#[test]
fn transcript_never_mixes_colors_within_a_session() {
    let buf = SharedBuf::default();
    let renderer: Arc<dyn RoomObserver> = Arc::new(ConsoleRenderer::new(buf.clone()));
    let sim = Simulation::configure(2, 4, 4)
        .unwrap()
        .with_env(SeededEnv::with_seed(17))
        .with_observer(renderer)
        .with_dwell(tiny_dwell());

    sim.run().unwrap();

    let text = buf.text();
    let mut session = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("----- ") {
            session = rest.strip_suffix(" Only -----").map(str::to_string);
        } else if let Some(color) = line.strip_prefix("Color: ") {
            assert_eq!(session.as_deref(), Some(color), "admission outside its session");
        } else if line == ">> Empty Fitting Room" {
            session = None;
        }
    }
    assert_eq!(text.matches("exits the fitting room.").count(), 8);
}

#[test]
fn seeded_start_order_is_reproducible() {
    let order = |seed| {
        Simulation::configure(3, 6, 6).unwrap().with_env(SeededEnv::with_seed(seed)).start_order()
    };

    assert_eq!(order(1234), order(1234));
    assert_eq!(order(1234).len(), 12);
}

#[test]
fn timed_out_workers_are_counted_not_fatal() {
    // One slot, one long stay: everyone else gives up.
    let sim = Simulation::configure(1, 3, 0)
        .unwrap()
        .with_env(SeededEnv::with_seed(2))
        .with_wait_policy(WaitPolicy::Timeout(Duration::from_millis(20)));

    let report = sim.spawn_and_run(|_, _| std::thread::sleep(Duration::from_millis(200))).unwrap();

    assert_eq!(report.admitted, [1, 0]);
    assert_eq!(report.timed_out, [2, 0]);
    assert_eq!(report.final_state.occupancy, 0);
    assert_eq!(report.final_state.registered, [0, 0]);
}

#[test]
fn panicking_worker_fails_the_run() {
    let sim = Simulation::configure(2, 1, 1).unwrap();

    let result = sim.spawn_and_run(|category, _| {
        if category == Category::Green {
            panic!("green action failed");
        }
    });

    assert!(matches!(result, Err(SimError::WorkerPanicked { category: Category::Green })));
}

#[test]
fn seeded_env_draws_reproducible_dwell_times() {
    let a = SeededEnv::with_seed(8);
    let b = SeededEnv::with_seed(8);
    let dwell = DwellRange::default();

    for _ in 0..16 {
        assert_eq!(dwell.sample(&a), dwell.sample(&b));
    }
    assert_eq!(a.seed(), 8);
    assert!(a.random_below(10) < 10);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn start_order_is_a_permutation_of_the_workers(
        seed in any::<u64>(),
        capacity in 1i64..5,
        blue in 0i64..12,
        green in 0i64..12,
    ) {
        prop_assume!(blue + green > 0);
        let sim = Simulation::configure(capacity, blue, green)
            .unwrap()
            .with_env(SeededEnv::with_seed(seed));

        let order = sim.start_order();
        let count = |category| order.iter().filter(|c| **c == category).count();

        prop_assert_eq!(order.len(), sim.config().total_workers());
        prop_assert_eq!(count(Category::Blue), sim.config().workers(Category::Blue));
        prop_assert_eq!(count(Category::Green), sim.config().workers(Category::Green));
    }

    #[test]
    fn dwell_sample_stays_within_bounds(
        seed in any::<u64>(),
        min_us in 0u64..5_000,
        span_us in 0u64..5_000,
    ) {
        let min = Duration::from_micros(min_us);
        let max = Duration::from_micros(min_us + span_us);
        let dwell = DwellRange::new(min, max).unwrap();
        let env = SeededEnv::with_seed(seed);

        for _ in 0..8 {
            let sample = dwell.sample(&env);
            if min == max {
                prop_assert_eq!(sample, min);
            } else {
                prop_assert!(
                    sample >= min && sample < max,
                    "{:?} outside [{:?}, {:?})",
                    sample,
                    min,
                    max
                );
            }
        }
    }
}
