//! Randomized scheduler invariants.
//!
//! These properties drive the loop with arbitrary schedules and monotonic
//! `process` sequences and check the contracts that hold for *any* such
//! sequence: one-shots fire exactly once, firing order is due-time-major
//! and FIFO-minor, recurring events re-arm relative to the processed tick,
//! and `always` events fire once per call.

mod common;

use common::*;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use tickloop::{EventLoop, Tick};

proptest! {
    #[test]
    fn one_shots_fire_exactly_once(
        schedule in prop::collection::vec((0u32..400, any::<bool>()), 1..32),
        steps in prop::collection::vec(1u32..120, 1..16),
    ) {
        init_test_logging();
        let event_loop = EventLoop::new();

        let mut observers = Vec::new();
        for (delay, cancel) in &schedule {
            let (count, handler) = fire_counter();
            let listener = event_loop.schedule(Tick::from(*delay), handler);
            if *cancel {
                listener.cancel();
            }
            observers.push((count, *cancel));
        }

        let mut now = 0u32;
        for step in steps {
            now += step;
            event_loop.process(Tick::from(now)).unwrap();
        }
        // Push time past every scheduled delay.
        event_loop.process(Tick::from(now.max(400))).unwrap();

        for (index, (count, cancelled)) in observers.iter().enumerate() {
            let expected = u32::from(!cancelled);
            prop_assert_eq!(
                count.get(),
                expected,
                "event {} (cancelled: {})",
                index,
                cancelled
            );
        }
        prop_assert!(event_loop.is_idle());
    }

    #[test]
    fn firing_order_is_due_time_major_fifo_minor(
        delays in prop::collection::vec(0u32..50, 1..24),
    ) {
        init_test_logging();
        let event_loop = EventLoop::new();
        let fired: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));

        for (index, delay) in delays.iter().enumerate() {
            let log = Rc::clone(&fired);
            event_loop.schedule(Tick::from(*delay), move || {
                log.borrow_mut().push(index);
                Ok(())
            });
        }
        event_loop.process(100).unwrap();

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|&index| (delays[index], index));
        prop_assert_eq!(&*fired.borrow(), &expected);
    }

    #[test]
    fn recurring_rearm_tracks_the_processed_tick(
        interval in 1u32..40,
        steps in prop::collection::vec(1u32..90, 1..24),
    ) {
        init_test_logging();
        let event_loop = EventLoop::new();
        let (count, handler) = fire_counter();
        event_loop.schedule_recurring(Tick::from(interval), handler);

        let mut now = 0u32;
        let mut next_due = interval;
        let mut expected = 0u32;
        for step in steps {
            now += step;
            event_loop.process(Tick::from(now)).unwrap();
            if now >= next_due {
                expected += 1;
                next_due = now + interval;
            }
            prop_assert_eq!(count.get(), expected, "after process({})", now);
        }
    }

    #[test]
    fn always_fires_once_per_process_call(
        steps in prop::collection::vec(0u32..60, 1..24),
    ) {
        init_test_logging();
        let event_loop = EventLoop::new();
        let (count, handler) = fire_counter();
        event_loop.always(handler);

        let mut now = 0u32;
        for (calls, step) in steps.iter().enumerate() {
            now += step;
            event_loop.process(Tick::from(now)).unwrap();
            prop_assert_eq!(count.get(), calls as u32 + 1);
        }
    }
}

#[test]
fn listener_expiry_follows_the_fire() {
    init_test_logging();
    let event_loop = EventLoop::new();
    let (count, handler) = fire_counter();
    let listener = event_loop.schedule(10, handler);

    event_loop.process(9).unwrap();
    assert!(!listener.is_expired());
    event_loop.process(10).unwrap();
    assert!(listener.is_expired());
    assert_eq!(count.get(), 1);
}
