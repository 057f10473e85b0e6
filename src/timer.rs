//! Cancellation-safe timers over a host scheduler.
//!
//! Provides [`Timer`], which pairs a caller-supplied [`TimerTask`] with the
//! scheduling state needed to register it with a [`HostScheduler`]. Each
//! registration hands the host a [`Firing`] stamped with the timer's current
//! cancellation epoch. Cancelling (explicitly, or implicitly by rescheduling)
//! bumps the epoch, so a firing the host delivers late is recognised as stale
//! and dropped without running the task.

use core::fmt;

use crate::command::TimerAction;
use crate::host::HostScheduler;
use crate::log::{debug, trace};
use crate::types::{Firing, TimerError, TimerId, TimerState};

/// The work a timer performs when it fires.
///
/// `run` receives a [`TimerContext`] for the owning timer, so the task can
/// reschedule or cancel itself while it runs.
pub trait TimerTask<H: HostScheduler> {
    /// Called on every legitimate firing.
    fn run(&mut self, timer: &mut TimerContext<'_, '_, H>);
}

/// Adapts a closure into a [`TimerTask`].
///
/// Usually created through [`Timer::from_fn`].
pub struct FnTask<F>(pub F);

impl<H, F> TimerTask<H> for FnTask<F>
where
    H: HostScheduler,
    F: FnMut(&mut TimerContext<'_, '_, H>),
{
    #[inline]
    fn run(&mut self, timer: &mut TimerContext<'_, '_, H>) {
        (self.0)(timer)
    }
}

impl<F> fmt::Debug for FnTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask").finish_non_exhaustive()
    }
}

/// Scheduling state of a timer, kept apart from its task so that the task
/// can borrow it mutably from inside `run`.
struct Scheduling<'h, H: HostScheduler> {
    id: TimerId,
    host: &'h H,
    is_repeating: bool,
    handle: Option<H::Handle>,
    // Bumped on every effective cancel; never reset.
    cancel_epoch: u32,
}

impl<'h, H: HostScheduler> Scheduling<'h, H> {
    fn new(id: TimerId, host: &'h H, cancel_epoch: u32) -> Self {
        Self {
            id,
            host,
            is_repeating: false,
            handle: None,
            cancel_epoch,
        }
    }

    #[inline]
    fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    fn state(&self) -> TimerState {
        match self.handle {
            None => TimerState::Idle,
            Some(_) if self.is_repeating => TimerState::ScheduledRepeating,
            Some(_) => TimerState::ScheduledOnce,
        }
    }

    fn cancel(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.cancel_epoch = self.cancel_epoch.wrapping_add(1);
        if self.is_repeating {
            self.host.cancel_repeating(handle);
        } else {
            self.host.cancel_once(handle);
        }

        debug!("timer {} cancelled, epoch now {}", self.id, self.cancel_epoch);
    }

    fn schedule(&mut self, delay_millis: i32) -> Result<(), TimerError> {
        if delay_millis < 0 {
            return Err(TimerError::InvalidArgument {
                argument: "delay_millis",
                expected: "non-negative",
                actual: delay_millis,
            });
        }

        if self.is_running() {
            self.cancel();
        }

        self.is_repeating = false;
        let firing = Firing::new(self.id, self.cancel_epoch);
        self.handle = Some(self.host.schedule_once(firing, delay_millis.unsigned_abs()));

        trace!("timer {} scheduled once in {} ms", self.id, delay_millis);
        Ok(())
    }

    fn schedule_repeating(&mut self, period_millis: i32) -> Result<(), TimerError> {
        if period_millis <= 0 {
            return Err(TimerError::InvalidArgument {
                argument: "period_millis",
                expected: "positive",
                actual: period_millis,
            });
        }

        if self.is_running() {
            self.cancel();
        }

        self.is_repeating = true;
        let firing = Firing::new(self.id, self.cancel_epoch);
        self.handle = Some(
            self.host
                .schedule_repeating(firing, period_millis.unsigned_abs()),
        );

        trace!("timer {} scheduled every {} ms", self.id, period_millis);
        Ok(())
    }

    /// A firing is live only if it was minted by this timer under the
    /// current epoch while a registration is outstanding.
    fn is_live(&self, firing: Firing) -> bool {
        firing.timer() == self.id && firing.epoch() == self.cancel_epoch && self.is_running()
    }
}

impl<H: HostScheduler> Drop for Scheduling<'_, H> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Control surface handed to [`TimerTask::run`].
///
/// Gives the running task the same scheduling operations as the owning
/// [`Timer`]. For a one-shot timer the registration has already been consumed
/// when `run` is called, so `is_running()` reports `false` unless the task
/// reschedules.
pub struct TimerContext<'a, 'h, H: HostScheduler> {
    scheduling: &'a mut Scheduling<'h, H>,
}

impl<H: HostScheduler> TimerContext<'_, '_, H> {
    /// Returns the id of the owning timer.
    pub fn id(&self) -> TimerId {
        self.scheduling.id
    }

    /// Returns true if the owning timer is registered with the host.
    pub fn is_running(&self) -> bool {
        self.scheduling.is_running()
    }

    /// Returns the scheduling state of the owning timer.
    pub fn state(&self) -> TimerState {
        self.scheduling.state()
    }

    /// Cancels the owning timer. See [`Timer::cancel`].
    pub fn cancel(&mut self) {
        self.scheduling.cancel();
    }

    /// Reschedules the owning timer as a one-shot. See [`Timer::schedule`].
    pub fn schedule(&mut self, delay_millis: i32) -> Result<(), TimerError> {
        self.scheduling.schedule(delay_millis)
    }

    /// Reschedules the owning timer as repeating. See [`Timer::schedule_repeating`].
    pub fn schedule_repeating(&mut self, period_millis: i32) -> Result<(), TimerError> {
        self.scheduling.schedule_repeating(period_millis)
    }
}

/// A unit of deferred work that can be scheduled once or repeatedly.
///
/// The timer borrows its host for `'h` and owns its task. Dropping a running
/// timer cancels its host registration.
///
/// # Type Parameters
/// * `'h` - Lifetime of the host scheduler reference
/// * `H` - Host scheduler implementation type
/// * `T` - Task implementation type
pub struct Timer<'h, H: HostScheduler, T> {
    scheduling: Scheduling<'h, H>,
    task: T,
}

impl<'h, H: HostScheduler, T: TimerTask<H>> Timer<'h, H, T> {
    /// Creates an idle timer with the default id.
    pub fn new(host: &'h H, task: T) -> Self {
        Self::with_id(TimerId::default(), host, task)
    }

    /// Creates an idle timer that stamps its firings with `id`.
    ///
    /// Use distinct ids for timers that share a host and have their firings
    /// routed by id.
    pub fn with_id(id: TimerId, host: &'h H, task: T) -> Self {
        Self::with_epoch(id, host, task, 0)
    }

    /// Creates an idle timer whose epoch continues from a retired timer that
    /// used the same id, so that firings still queued for the old timer
    /// cannot match the new one.
    pub(crate) fn with_epoch(id: TimerId, host: &'h H, task: T, cancel_epoch: u32) -> Self {
        Self {
            scheduling: Scheduling::new(id, host, cancel_epoch),
            task,
        }
    }

    /// Handles a timer action by dispatching to the appropriate method.
    pub fn handle_action(&mut self, action: TimerAction) -> Result<(), TimerError> {
        match action {
            TimerAction::Schedule(delay_millis) => self.schedule(delay_millis),
            TimerAction::ScheduleRepeating(period_millis) => self.schedule_repeating(period_millis),
            TimerAction::Cancel => {
                self.cancel();
                Ok(())
            }
        }
    }

    /// Schedules the timer to fire once, `delay_millis` from now.
    ///
    /// A running timer is cancelled first, so stale firings from the previous
    /// registration are ignored.
    ///
    /// # Errors
    /// `InvalidArgument` if `delay_millis` is negative. The timer is unchanged.
    pub fn schedule(&mut self, delay_millis: i32) -> Result<(), TimerError> {
        self.scheduling.schedule(delay_millis)
    }

    /// Schedules the timer to fire every `period_millis`.
    ///
    /// A running timer is cancelled first.
    ///
    /// # Errors
    /// `InvalidArgument` if `period_millis` is zero or negative. The timer is
    /// unchanged.
    pub fn schedule_repeating(&mut self, period_millis: i32) -> Result<(), TimerError> {
        self.scheduling.schedule_repeating(period_millis)
    }

    /// Cancels the timer. No-op if it is not running.
    ///
    /// Any firing already handed to the host becomes stale, whether or not
    /// the host honors the cancellation.
    pub fn cancel(&mut self) {
        self.scheduling.cancel();
    }

    /// Delivers a firing from the host.
    ///
    /// Runs the task if the firing belongs to the current registration. A
    /// one-shot timer is marked idle before its task runs. Stale firings
    /// (cancelled, superseded by a reschedule, or meant for another timer)
    /// are dropped silently.
    ///
    /// # Returns
    /// * `true` - The task ran
    /// * `false` - The firing was stale
    pub fn fire(&mut self, firing: Firing) -> bool {
        if !self.scheduling.is_live(firing) {
            trace!("timer {} dropped stale firing {}", self.scheduling.id, firing);
            return false;
        }

        if !self.scheduling.is_repeating {
            self.scheduling.handle = None;
        }

        self.task.run(&mut TimerContext {
            scheduling: &mut self.scheduling,
        });
        true
    }

    /// Cancels the timer and returns its task.
    pub fn into_task(self) -> T {
        self.retire().0
    }

    /// Cancels the timer and returns its task along with the final epoch.
    pub(crate) fn retire(self) -> (T, u32) {
        let Timer {
            mut scheduling,
            task,
        } = self;
        scheduling.cancel();
        (task, scheduling.cancel_epoch)
    }
}

impl<'h, H: HostScheduler, F> Timer<'h, H, FnTask<F>> {
    /// Creates an idle timer that runs a closure.
    pub fn from_fn(host: &'h H, f: F) -> Self
    where
        F: FnMut(&mut TimerContext<'_, '_, H>),
    {
        Timer::new(host, FnTask(f))
    }
}

impl<H: HostScheduler, T> Timer<'_, H, T> {
    /// Returns the timer's id.
    pub fn id(&self) -> TimerId {
        self.scheduling.id
    }

    /// Returns true if the timer is registered with the host.
    pub fn is_running(&self) -> bool {
        self.scheduling.is_running()
    }

    /// Returns the current scheduling state.
    pub fn state(&self) -> TimerState {
        self.scheduling.state()
    }

    /// Returns a reference to the task.
    pub fn task(&self) -> &T {
        &self.task
    }

    /// Returns a mutable reference to the task.
    pub fn task_mut(&mut self) -> &mut T {
        &mut self.task
    }
}

impl<H: HostScheduler, T> fmt::Debug for Timer<'_, H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.scheduling.id)
            .field("state", &self.scheduling.state())
            .field("cancel_epoch", &self.scheduling.cancel_epoch)
            .finish_non_exhaustive()
    }
}
