//! Shared test infrastructure for host-timer integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};

use host_timer::{Firing, HostScheduler, TimeDuration, TimeInstant, TimeSource, TimerContext, TimerTask};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        self.0.checked_add(duration.0).map(TestInstant)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u64) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + millis));
    }

    pub fn set_time(&self, time: TestInstant) {
        self.current_time.set(time);
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Recording Host
// ============================================================================

/// A registration made with the `RecordingHost`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub handle: usize,
    pub firing: Firing,
    pub millis: u32,
    pub repeating: bool,
    pub cancelled: bool,
}

/// Host that records every call and never drops a registration.
///
/// Tests deliver firings by hand, which makes it possible to simulate a host
/// that keeps delivering callbacks after being asked to cancel them.
pub struct RecordingHost {
    registrations: RefCell<heapless::Vec<Registration, 32>>,
    cancel_once_calls: Cell<usize>,
    cancel_repeating_calls: Cell<usize>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            registrations: RefCell::new(heapless::Vec::new()),
            cancel_once_calls: Cell::new(0),
            cancel_repeating_calls: Cell::new(0),
        }
    }

    /// Returns the registration with the given handle
    pub fn registration(&self, handle: usize) -> Registration {
        self.registrations.borrow()[handle]
    }

    /// Returns the firing of the given registration, cancelled or not
    pub fn firing(&self, handle: usize) -> Firing {
        self.registration(handle).firing
    }

    /// Returns the handle of the most recent registration
    pub fn last_handle(&self) -> Option<usize> {
        self.registrations.borrow().len().checked_sub(1)
    }

    /// Number of registrations that were never cancelled
    pub fn active(&self) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| !r.cancelled)
            .count()
    }

    pub fn registrations(&self) -> usize {
        self.registrations.borrow().len()
    }

    pub fn cancel_once_calls(&self) -> usize {
        self.cancel_once_calls.get()
    }

    pub fn cancel_repeating_calls(&self) -> usize {
        self.cancel_repeating_calls.get()
    }

    fn register(&self, firing: Firing, millis: u32, repeating: bool) -> usize {
        let mut registrations = self.registrations.borrow_mut();
        let handle = registrations.len();
        registrations
            .push(Registration {
                handle,
                firing,
                millis,
                repeating,
                cancelled: false,
            })
            .expect("recording host is full");
        handle
    }

    fn mark_cancelled(&self, handle: usize) {
        self.registrations.borrow_mut()[handle].cancelled = true;
    }
}

impl HostScheduler for RecordingHost {
    type Handle = usize;

    fn schedule_once(&self, firing: Firing, delay_millis: u32) -> usize {
        self.register(firing, delay_millis, false)
    }

    fn schedule_repeating(&self, firing: Firing, period_millis: u32) -> usize {
        self.register(firing, period_millis, true)
    }

    fn cancel_once(&self, handle: usize) {
        self.cancel_once_calls.set(self.cancel_once_calls.get() + 1);
        self.mark_cancelled(handle);
    }

    fn cancel_repeating(&self, handle: usize) {
        self.cancel_repeating_calls
            .set(self.cancel_repeating_calls.get() + 1);
        self.mark_cancelled(handle);
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// Task that counts how many times it ran
#[derive(Debug, Default)]
pub struct CountingTask {
    pub runs: u32,
}

impl<H: HostScheduler> TimerTask<H> for CountingTask {
    fn run(&mut self, _timer: &mut TimerContext<'_, '_, H>) {
        self.runs += 1;
    }
}
