//! Room protocol tests
//!
//! Each test drives real threads through the room and ends with an oracle
//! over what the occupancy actions observed while inside.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use fitroom_core::{
    Category, Room, RoomConfig, RoomError, RoomEvent, RoomObserver, WaitPolicy, WaitStage,
    WorkerId,
};
use parking_lot::Mutex;

/// Counts occupants from inside the occupancy action.
#[derive(Default)]
struct Probe {
    inside: [AtomicUsize; 2],
    peak: AtomicUsize,
    mixed: AtomicBool,
    completed: AtomicUsize,
}

impl Probe {
    fn occupy(&self, category: Category, dwell: Duration) {
        let mine = self.inside[category.index()].fetch_add(1, Ordering::SeqCst) + 1;
        if self.inside[category.opposite().index()].load(Ordering::SeqCst) > 0 {
            self.mixed.store(true, Ordering::SeqCst);
        }
        self.peak.fetch_max(mine, Ordering::SeqCst);

        thread::sleep(dwell);

        self.inside[category.index()].fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every event in emission order.
#[derive(Default)]
struct Events(Mutex<Vec<RoomEvent>>);

impl RoomObserver for Events {
    fn on_session_start(&self, category: Category) {
        self.0.lock().push(RoomEvent::SessionStarted { category });
    }

    fn on_worker_admitted(&self, id: WorkerId, category: Category) {
        self.0.lock().push(RoomEvent::WorkerAdmitted { id, category });
    }

    fn on_worker_departed(&self, id: WorkerId, category: Category) {
        self.0.lock().push(RoomEvent::WorkerDeparted { id, category });
    }

    fn on_room_empty(&self) {
        self.0.lock().push(RoomEvent::RoomEmptied);
    }
}

fn room(capacity: usize) -> Room {
    Room::new(NonZeroUsize::new(capacity).unwrap())
}

/// Run `blue` and `green` workers concurrently, each dwelling for `dwell`.
fn run_workers(room: &Room, probe: &Probe, blue: usize, green: usize, dwell: Duration) {
    let categories = std::iter::repeat_n(Category::Blue, blue)
        .chain(std::iter::repeat_n(Category::Green, green))
        .collect::<Vec<_>>();

    thread::scope(|s| {
        let handles: Vec<_> = categories
            .into_iter()
            .map(|category| {
                s.spawn(move || room.visit(category, |category, _| probe.occupy(category, dwell)))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
    });
}

/// Oracle: the room is back to its initial state.
fn verify_quiescent(room: &Room) {
    let snapshot = room.snapshot();
    assert_eq!(snapshot.occupancy, 0, "final occupancy must be zero");
    assert_eq!(snapshot.occupying, None);
    assert_eq!(snapshot.registered, [0, 0], "category gates must be empty");
    assert_eq!(snapshot.available, [room.capacity().get(); 2], "all permits returned");
    assert_eq!(snapshot.exclusion_holder, None, "exclusion lock released");
    assert_eq!(snapshot.exclusion_waiters, 0);
}

#[test]
fn single_slot_runs_workers_sequentially() {
    let room = room(1);
    let probe = Probe::default();

    run_workers(&room, &probe, 2, 0, Duration::from_millis(20));

    assert_eq!(probe.peak.load(Ordering::SeqCst), 1, "workers must never overlap");
    assert_eq!(probe.completed.load(Ordering::SeqCst), 2);
    verify_quiescent(&room);
}

#[test]
fn capacity_bounds_same_category_occupancy() {
    let room = room(3);
    let probe = Probe::default();

    run_workers(&room, &probe, 5, 0, Duration::from_millis(20));

    assert!(probe.peak.load(Ordering::SeqCst) <= 3, "at most 3 concurrent occupants");
    assert_eq!(probe.completed.load(Ordering::SeqCst), 5);
    verify_quiescent(&room);
}

#[test]
fn categories_never_mix() {
    let events = Arc::new(Events::default());
    let room = room(2).with_observer(Arc::clone(&events) as Arc<dyn RoomObserver>);
    let probe = Probe::default();

    run_workers(&room, &probe, 3, 3, Duration::from_millis(10));

    assert!(!probe.mixed.load(Ordering::SeqCst), "blue and green shared the room");
    assert!(probe.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(probe.completed.load(Ordering::SeqCst), 6);
    assert_eq!(room.snapshot().issued, 6);

    let admitted = events
        .0
        .lock()
        .iter()
        .filter(|e| matches!(e, RoomEvent::WorkerAdmitted { .. }))
        .count();
    assert_eq!(admitted, 6);
    verify_quiescent(&room);
}

#[test]
fn ids_strictly_increase_in_admission_order() {
    let events = Arc::new(Events::default());
    let room = room(4).with_observer(Arc::clone(&events) as Arc<dyn RoomObserver>);
    let probe = Probe::default();

    run_workers(&room, &probe, 6, 6, Duration::from_millis(1));

    let ids: Vec<u64> = events
        .0
        .lock()
        .iter()
        .filter_map(|e| match e {
            RoomEvent::WorkerAdmitted { id, .. } => Some(id.get()),
            _ => None,
        })
        .collect();

    assert_eq!(ids, (1..=12).collect::<Vec<_>>());
}

#[test]
fn waiting_worker_blocks_later_arrivals_at_turnstile() {
    let events = Arc::new(Events::default());
    let room = room(3).with_observer(Arc::clone(&events) as Arc<dyn RoomObserver>);

    let first_blue = room.enter(Category::Blue).unwrap();

    thread::scope(|s| {
        let green = s.spawn(|| room.visit(Category::Green, |_, _| {}));

        // Green is first of its category and must wait for blue to clear out.
        while room.snapshot().exclusion_waiters == 0 {
            thread::yield_now();
        }
        assert!(room.snapshot().turnstile_held, "waiting green must hold the turnstile");

        // A later blue arrival cannot cut in line, even with free slots.
        let late_blue =
            room.enter_within(Category::Blue, WaitPolicy::Timeout(Duration::from_millis(50)));
        assert_eq!(
            late_blue.map(|o| o.id()),
            Err(RoomError::Timeout { category: Category::Blue, stage: WaitStage::Turnstile })
        );

        first_blue.leave().unwrap();
        assert_eq!(green.join().unwrap().unwrap(), WorkerId(2));
    });

    assert_eq!(
        *events.0.lock(),
        vec![
            RoomEvent::SessionStarted { category: Category::Blue },
            RoomEvent::WorkerAdmitted { id: WorkerId(1), category: Category::Blue },
            RoomEvent::WorkerDeparted { id: WorkerId(1), category: Category::Blue },
            RoomEvent::RoomEmptied,
            RoomEvent::SessionStarted { category: Category::Green },
            RoomEvent::WorkerAdmitted { id: WorkerId(2), category: Category::Green },
            RoomEvent::WorkerDeparted { id: WorkerId(2), category: Category::Green },
            RoomEvent::RoomEmptied,
        ]
    );
    verify_quiescent(&room);
}

#[test]
fn registered_workers_finish_before_waiting_category() {
    let events = Arc::new(Events::default());
    let room = room(1).with_observer(Arc::clone(&events) as Arc<dyn RoomObserver>);

    // Blue #1 inside, blue #2 registered and waiting for the single slot.
    let first_blue = room.enter(Category::Blue).unwrap();

    thread::scope(|s| {
        let second_blue = s.spawn(|| room.visit(Category::Blue, |_, _| {}));
        while room.snapshot().registered(Category::Blue) < 2 {
            thread::yield_now();
        }

        let green = s.spawn(|| room.visit(Category::Green, |_, _| {}));
        while room.snapshot().exclusion_waiters == 0 {
            thread::yield_now();
        }

        first_blue.leave().unwrap();
        assert_eq!(second_blue.join().unwrap().unwrap(), WorkerId(2));
        assert_eq!(green.join().unwrap().unwrap(), WorkerId(3));
    });

    // The room empties between the two blues, so each one opens a session.
    let admitted: Vec<Category> = events
        .0
        .lock()
        .iter()
        .filter_map(|e| match e {
            RoomEvent::WorkerAdmitted { category, .. } => Some(*category),
            _ => None,
        })
        .collect();
    assert_eq!(admitted, vec![Category::Blue, Category::Blue, Category::Green]);
    verify_quiescent(&room);
}

#[test]
fn panicking_action_still_leaves() {
    let room = room(1);

    thread::scope(|s| {
        let result = s.spawn(|| room.visit(Category::Green, |_, _| panic!("boom"))).join();
        assert!(result.is_err(), "the action's panic propagates to the worker");
    });

    verify_quiescent(&room);
    assert_eq!(room.visit(Category::Blue, |_, _| {}).unwrap(), WorkerId(2));
}

#[test]
fn room_from_config_uses_capacity() {
    let config = RoomConfig::new(4, 1, 1).unwrap();
    let room = Room::from_config(&config);

    assert_eq!(room.capacity().get(), 4);
    assert_eq!(room.snapshot().available, [4, 4]);
}
