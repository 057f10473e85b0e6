//! Command-based control for timers.

use crate::types::TimerId;

/// Actions for controlling timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerAction {
    /// Schedule once after the given delay in milliseconds.
    Schedule(i32),
    /// Schedule repeatedly with the given period in milliseconds.
    ScheduleRepeating(i32),
    /// Cancel.
    Cancel,
}

/// Command targeting a specific timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerCommand {
    pub timer_id: TimerId,
    pub action: TimerAction,
}

impl TimerCommand {
    /// Creates command.
    pub fn new(timer_id: TimerId, action: TimerAction) -> Self {
        Self { timer_id, action }
    }
}
