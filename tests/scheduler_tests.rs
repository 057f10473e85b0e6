//! Integration tests for QueueScheduler driving real timers

mod common;
use common::*;

use core::cell::Cell;

use host_timer::{CancelPolicy, QueueScheduler, Timer, TimerState, TimerTask};

type Scheduler<'t> = QueueScheduler<'t, TestInstant, MockTimeSource, 8>;

/// Delivers every due firing to `timer`, returning how many ran the task.
fn drain<'t, T: TimerTask<Scheduler<'t>>>(
    scheduler: &Scheduler<'t>,
    timer: &mut Timer<'_, Scheduler<'t>, T>,
) -> usize {
    let mut ran = 0;
    while let Some(firing) = scheduler.poll() {
        if timer.fire(firing) {
            ran += 1;
        }
    }
    ran
}

#[test]
fn scenario_a_fires_after_delay() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::new(&clock);
    let mut timer = Timer::new(&scheduler, CountingTask::default());

    timer.schedule(100).unwrap();

    clock.advance(99);
    assert_eq!(drain(&scheduler, &mut timer), 0);
    assert!(timer.is_running());

    clock.advance(1);
    assert_eq!(drain(&scheduler, &mut timer), 1);
    assert!(!timer.is_running());
    assert!(scheduler.is_empty());
}

#[test]
fn scenario_b_with_host_ignoring_cancellation() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::with_cancel_policy(&clock, CancelPolicy::Ignore);
    let mut timer = Timer::new(&scheduler, CountingTask::default());

    timer.schedule(100).unwrap();
    clock.advance(50);
    timer.cancel();
    assert_eq!(scheduler.pending(), 1);

    clock.advance(50);
    assert_eq!(drain(&scheduler, &mut timer), 0);
    assert_eq!(timer.task().runs, 0);
    assert!(!timer.is_running());
}

#[test]
fn scenario_c_repeating_every_period() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::new(&clock);
    let mut timer = Timer::new(&scheduler, CountingTask::default());

    timer.schedule_repeating(50).unwrap();
    for _ in 0..3 {
        clock.advance(50);
        assert_eq!(drain(&scheduler, &mut timer), 1);
        assert!(timer.is_running());
    }
    assert_eq!(timer.task().runs, 3);

    timer.cancel();
    clock.advance(500);
    assert_eq!(drain(&scheduler, &mut timer), 0);
    assert_eq!(timer.task().runs, 3);
    assert!(scheduler.is_empty());
}

#[test]
fn scenario_c_with_host_ignoring_cancellation() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::with_cancel_policy(&clock, CancelPolicy::Ignore);
    let mut timer = Timer::new(&scheduler, CountingTask::default());

    timer.schedule_repeating(50).unwrap();
    clock.advance(150);
    // Phase resets rather than bursting
    assert_eq!(drain(&scheduler, &mut timer), 1);

    timer.cancel();
    for _ in 0..3 {
        clock.advance(50);
        assert_eq!(drain(&scheduler, &mut timer), 0);
    }
    assert_eq!(timer.task().runs, 1);
    // The host still holds the ignored registration
    assert_eq!(scheduler.pending(), 1);
}

#[test]
fn scenario_d_reschedule_timeline() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::with_cancel_policy(&clock, CancelPolicy::Ignore);
    let mut timer = Timer::new(&scheduler, CountingTask::default());

    timer.schedule(100).unwrap();
    clock.advance(10);
    timer.schedule(200).unwrap();

    // t=100: the superseded callback arrives and is dropped
    clock.set_time(TestInstant(100));
    assert_eq!(drain(&scheduler, &mut timer), 0);
    assert!(timer.is_running());

    // t=209: not yet
    clock.set_time(TestInstant(209));
    assert_eq!(drain(&scheduler, &mut timer), 0);

    // t=210: the rescheduled callback runs the task
    clock.set_time(TestInstant(210));
    assert_eq!(drain(&scheduler, &mut timer), 1);
    assert_eq!(timer.state(), TimerState::Idle);
}

#[test]
fn zero_delay_fires_on_next_poll() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::new(&clock);
    let mut timer = Timer::new(&scheduler, CountingTask::default());

    timer.schedule(0).unwrap();
    assert_eq!(scheduler.time_until_next(), Some(TestDuration(0)));
    assert_eq!(drain(&scheduler, &mut timer), 1);
}

#[test]
fn task_rescheduling_during_poll_does_not_fire_in_same_pass() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::new(&clock);
    let runs = Cell::new(0);
    let mut timer = Timer::from_fn(&scheduler, |timer| {
        runs.set(runs.get() + 1);
        timer.schedule(10).unwrap();
    });

    timer.schedule(10).unwrap();
    clock.advance(10);
    while let Some(firing) = scheduler.poll() {
        timer.fire(firing);
    }

    assert_eq!(runs.get(), 1);
    assert!(timer.is_running());
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.time_until_next(), Some(TestDuration(10)));
}

#[test]
fn time_until_next_tracks_earliest_deadline() {
    let clock = MockTimeSource::new();
    let scheduler = Scheduler::new(&clock);
    let mut slow = Timer::new(&scheduler, CountingTask::default());
    let mut fast = Timer::new(&scheduler, CountingTask::default());

    assert_eq!(scheduler.time_until_next(), None);

    slow.schedule(300).unwrap();
    fast.schedule_repeating(40).unwrap();
    assert_eq!(scheduler.time_until_next(), Some(TestDuration(40)));

    clock.advance(25);
    assert_eq!(scheduler.time_until_next(), Some(TestDuration(15)));

    fast.cancel();
    assert_eq!(scheduler.next_due(), Some(TestInstant(300)));
}

#[test]
#[should_panic(expected = "capacity")]
fn exceeding_capacity_panics() {
    let clock = MockTimeSource::new();
    let scheduler = QueueScheduler::<TestInstant, MockTimeSource, 1>::new(&clock);
    let mut first = Timer::new(&scheduler, CountingTask::default());
    let mut second = Timer::new(&scheduler, CountingTask::default());

    first.schedule(10).unwrap();
    second.schedule(10).unwrap();
}
