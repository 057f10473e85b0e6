//! Core types shared by timers, hosts and collections.

/// An identifier for a timer.
///
/// Every [`Firing`] carries the id of the timer that minted it, so firings
/// delivered by a shared host can be routed back to the right timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub usize);

impl From<usize> for TimerId {
    fn from(id: usize) -> Self {
        TimerId(id)
    }
}

impl From<TimerId> for usize {
    fn from(id: TimerId) -> Self {
        id.0
    }
}

/// The token a timer hands to its host when it registers a schedule.
///
/// A host stores the firing and delivers it back when the delay or period
/// elapses. It captures the timer's cancellation epoch at the moment of
/// scheduling; a timer only runs its task for a firing whose epoch is still
/// current. Firings can only be created by a [`Timer`](crate::Timer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Firing {
    timer: TimerId,
    epoch: u32,
}

impl Firing {
    pub(crate) fn new(timer: TimerId, epoch: u32) -> Self {
        Self { timer, epoch }
    }

    /// Returns the id of the timer this firing belongs to.
    #[inline]
    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub(crate) fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// Scheduling state of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    /// Not registered with the host.
    Idle,
    /// Registered as a one-shot. Returns to `Idle` when it fires.
    ScheduledOnce,
    /// Registered as repeating. Stays here until cancelled.
    ScheduledRepeating,
}

/// Errors raised by timer scheduling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// A delay or period was out of range. The timer is left untouched.
    InvalidArgument {
        /// Name of the rejected argument, e.g. "delay_millis"
        argument: &'static str,
        /// Human-readable description of the accepted range, e.g. "non-negative"
        expected: &'static str,
        /// The rejected value
        actual: i32,
    },
}

impl core::fmt::Display for TimerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimerError::InvalidArgument {
                argument,
                expected,
                actual,
            } => {
                write!(f, "invalid {}: expected {}, got {}", argument, expected, actual)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimerError {}
