use crate::command::{TimerAction, TimerCommand};
use crate::host::HostScheduler;
use crate::log::trace;
use crate::timer::{Timer, TimerTask};
use crate::types::{Firing, TimerError, TimerId, TimerState};

/// Errors that can occur during collection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CollectionError {
    /// The specified timer ID does not exist in the collection.
    InvalidTimerId(TimerId),

    /// Attempted to add a timer with an ID that already exists.
    DuplicateTimerId(TimerId),

    /// The timer ID exceeds the collection's capacity.
    TimerIdOutOfBounds { id: TimerId, capacity: usize },

    /// A timer operation failed.
    TimerError(TimerError),
}

impl core::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CollectionError::InvalidTimerId(id) => {
                write!(f, "timer ID {} does not exist in collection", id.0)
            }
            CollectionError::DuplicateTimerId(id) => {
                write!(f, "timer ID {} already exists in collection", id.0)
            }
            CollectionError::TimerIdOutOfBounds { id, capacity } => {
                write!(
                    f,
                    "timer ID {} exceeds collection capacity of {}",
                    id.0, capacity
                )
            }
            CollectionError::TimerError(err) => {
                write!(f, "timer error: {}", err)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CollectionError {}

impl From<TimerError> for CollectionError {
    fn from(err: TimerError) -> Self {
        CollectionError::TimerError(err)
    }
}

/// Manages a fixed set of timers that share one host.
///
/// Each timer is stored in the slot given by its `TimerId` and stamps that id
/// on its firings, so firings coming back from the host can be routed with
/// [`dispatch`](Self::dispatch). No heap allocation is involved.
///
/// # Type Parameters
/// * `'h` - Lifetime of the host scheduler reference
/// * `H` - Host scheduler implementation type
/// * `T` - Task type (must be the same for all timers in the collection)
/// * `MAX_TIMERS` - Maximum number of timers this collection can hold
pub struct TimerCollection<'h, H: HostScheduler, T, const MAX_TIMERS: usize> {
    timers: [Option<Timer<'h, H, T>>; MAX_TIMERS],
    // Epoch each slot resumes from, carried over from removed timers.
    epochs: [u32; MAX_TIMERS],
    host: &'h H,
}

impl<'h, H, T, const MAX_TIMERS: usize> TimerCollection<'h, H, T, MAX_TIMERS>
where
    H: HostScheduler,
    T: TimerTask<H>,
{
    /// Creates a new empty timer collection.
    ///
    /// # Arguments
    /// * `host` - Reference to the host scheduler used by all timers
    pub fn new(host: &'h H) -> Self {
        Self {
            timers: core::array::from_fn(|_| None),
            epochs: [0; MAX_TIMERS],
            host,
        }
    }

    /// Adds an idle timer running `task` under the specified ID.
    ///
    /// # Errors
    /// * `DuplicateTimerId` - A timer with this ID already exists
    /// * `TimerIdOutOfBounds` - The ID exceeds the collection's capacity
    pub fn add_timer(&mut self, id: TimerId, task: T) -> Result<(), CollectionError> {
        let idx = id.0;

        if idx >= MAX_TIMERS {
            return Err(CollectionError::TimerIdOutOfBounds {
                id,
                capacity: MAX_TIMERS,
            });
        }

        if self.timers[idx].is_some() {
            return Err(CollectionError::DuplicateTimerId(id));
        }

        self.timers[idx] = Some(Timer::with_epoch(id, self.host, task, self.epochs[idx]));
        Ok(())
    }

    /// Removes a timer, cancelling it, and returns its task.
    ///
    /// A timer added later under the same ID never runs for firings the host
    /// still holds for the removed one.
    ///
    /// # Errors
    /// Returns `InvalidTimerId` if the timer does not exist in the collection.
    pub fn remove_timer(&mut self, id: TimerId) -> Result<T, CollectionError> {
        let timer = self
            .timers
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(CollectionError::InvalidTimerId(id))?;

        let (task, epoch) = timer.retire();
        self.epochs[id.0] = epoch;
        Ok(task)
    }

    /// Routes a command to the specified timer.
    ///
    /// # Errors
    /// * `InvalidTimerId` - The timer does not exist
    /// * `TimerError` - The timer rejected the action's argument
    pub fn handle_command(&mut self, command: TimerCommand) -> Result<(), CollectionError> {
        self.handle_action(command.timer_id, command.action)
    }

    /// Routes an action to the specified timer.
    pub fn handle_action(&mut self, id: TimerId, action: TimerAction) -> Result<(), CollectionError> {
        let timer = self.get_mut(id).ok_or(CollectionError::InvalidTimerId(id))?;
        Ok(timer.handle_action(action)?)
    }

    /// Routes a firing delivered by the host to the timer that minted it.
    ///
    /// Firings for timers that have since been removed are dropped.
    ///
    /// # Returns
    /// * `true` - A task ran
    /// * `false` - The firing was stale or its timer is gone
    pub fn dispatch(&mut self, firing: Firing) -> bool {
        match self.get_mut(firing.timer()) {
            Some(timer) => timer.fire(firing),
            None => {
                trace!("no timer {} for firing", firing.timer());
                false
            }
        }
    }

    /// Dispatches a batch of firings, returning how many ran a task.
    pub fn dispatch_all<F>(&mut self, firings: F) -> usize
    where
        F: IntoIterator<Item = Firing>,
    {
        firings
            .into_iter()
            .filter(|firing| self.dispatch(*firing))
            .count()
    }

    /// Cancels every timer in the collection.
    pub fn cancel_all(&mut self) {
        for timer in self.timers.iter_mut().flatten() {
            timer.cancel();
        }
    }

    /// Returns the specified timer, if present.
    pub fn get(&self, id: TimerId) -> Option<&Timer<'h, H, T>> {
        self.timers.get(id.0).and_then(Option::as_ref)
    }

    /// Returns the specified timer mutably, if present.
    pub fn get_mut(&mut self, id: TimerId) -> Option<&mut Timer<'h, H, T>> {
        self.timers.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the scheduling state of the specified timer.
    ///
    /// # Errors
    /// Returns `InvalidTimerId` if the timer does not exist in the collection.
    pub fn state(&self, id: TimerId) -> Result<TimerState, CollectionError> {
        let timer = self.get(id).ok_or(CollectionError::InvalidTimerId(id))?;
        Ok(timer.state())
    }

    /// Returns true if the specified timer exists and is running.
    pub fn is_running(&self, id: TimerId) -> bool {
        self.get(id).is_some_and(|timer| timer.is_running())
    }

    /// Returns the number of running timers.
    pub fn running(&self) -> usize {
        self.timers
            .iter()
            .flatten()
            .filter(|timer| timer.is_running())
            .count()
    }

    /// Returns the number of timers currently in the collection.
    pub fn len(&self) -> usize {
        self.timers.iter().filter(|t| t.is_some()).count()
    }

    /// Returns true if the collection contains no timers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the collection contains a timer with the given ID.
    pub fn contains(&self, id: TimerId) -> bool {
        self.get(id).is_some()
    }
}
