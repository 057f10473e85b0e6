//! A cooperative, polled host scheduler.
//!
//! [`QueueScheduler`] implements [`HostScheduler`] on top of a [`TimeSource`]
//! for targets that have no timer service of their own: bare-metal main
//! loops, simulations and tests. It keeps registrations in a fixed-capacity
//! queue; the application polls it and routes the due firings to its timers.
//!
//! ```text
//! loop {
//!     while let Some(firing) = scheduler.poll() {
//!         timers.dispatch(firing);
//!     }
//!     sleep(scheduler.time_until_next());
//! }
//! ```

use core::cell::{Cell, RefCell};

use heapless::Vec;

use crate::host::HostScheduler;
use crate::log::{debug, trace};
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::Firing;

/// How a [`QueueScheduler`] treats cancellation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CancelPolicy {
    /// Cancelled registrations are removed from the queue.
    #[default]
    Honor,
    /// Cancellation requests are ignored and registrations keep firing.
    ///
    /// Emulates hosts whose cancellation is unreliable. Timers drop the
    /// resulting stale firings, but the entries keep occupying capacity.
    /// A cancelled repeating entry is re-armed forever and its slot is never
    /// freed, so repeatedly rescheduling a repeating timer eventually exceeds
    /// the capacity and panics.
    Ignore,
}

/// Handle for a registration with a [`QueueScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueHandle(u32);

#[derive(Debug, Clone, Copy)]
struct QueueEntry<I> {
    handle: QueueHandle,
    firing: Firing,
    // None if the deadline does not fit the instant type.
    due: Option<I>,
    period_millis: Option<u32>,
    // Insertion order; breaks ties between equal deadlines.
    seq: u32,
}

/// A polled [`HostScheduler`] driven by a [`TimeSource`].
///
/// Firings are returned from [`poll`](Self::poll) in deadline order, oldest
/// registration first on ties. A repeating registration is re-armed one
/// period after its previous deadline; if the scheduler has fallen a whole
/// period behind, its phase is reset to `now` instead of firing a burst.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `N` - Maximum number of outstanding registrations
pub struct QueueScheduler<'t, I: TimeInstant, T: TimeSource<I>, const N: usize> {
    time_source: &'t T,
    cancel_policy: CancelPolicy,
    entries: RefCell<Vec<QueueEntry<I>, N>>,
    next_handle: Cell<u32>,
    next_seq: Cell<u32>,
}

impl<'t, I: TimeInstant, T: TimeSource<I>, const N: usize> QueueScheduler<'t, I, T, N> {
    /// Creates an empty scheduler that honors cancellation.
    pub fn new(time_source: &'t T) -> Self {
        Self::with_cancel_policy(time_source, CancelPolicy::Honor)
    }

    /// Creates an empty scheduler with the given cancellation policy.
    pub fn with_cancel_policy(time_source: &'t T, cancel_policy: CancelPolicy) -> Self {
        Self {
            time_source,
            cancel_policy,
            entries: RefCell::new(Vec::new()),
            next_handle: Cell::new(0),
            next_seq: Cell::new(0),
        }
    }

    /// Returns the cancellation policy.
    pub fn cancel_policy(&self) -> CancelPolicy {
        self.cancel_policy
    }

    /// Returns the next due firing, if any.
    ///
    /// One-shot registrations are removed when returned; repeating ones are
    /// re-armed. Call repeatedly until it returns `None`. The internal queue is
    /// not borrowed while the caller handles the firing, so timers may
    /// reschedule or cancel from their tasks.
    pub fn poll(&self) -> Option<Firing> {
        let now = self.time_source.now();
        let mut entries = self.entries.borrow_mut();

        let idx = Self::earliest(&entries).filter(|&idx| Self::is_due(&entries[idx], now))?;
        let entry = entries[idx];

        match entry.period_millis {
            None => {
                entries.swap_remove(idx);
            }
            Some(period_millis) => {
                let period = I::Duration::from_millis(u64::from(period_millis));
                let next = entry
                    .due
                    .and_then(|due| due.checked_add(period))
                    .filter(|next| *next > now)
                    .or_else(|| now.checked_add(period));

                let rearmed = &mut entries[idx];
                rearmed.due = next;
                rearmed.seq = self.bump_seq();
                trace!("re-armed repeating entry {}", entry.handle);
            }
        }

        Some(entry.firing)
    }

    /// Returns the earliest deadline among outstanding registrations.
    pub fn next_due(&self) -> Option<I> {
        let entries = self.entries.borrow();
        Self::earliest(&entries).and_then(|idx| entries[idx].due)
    }

    /// Returns how long until the next registration is due.
    ///
    /// # Returns
    /// * `Some(Duration::ZERO)` - A firing is already due, poll now
    /// * `Some(duration)` - Sleep for this duration before polling
    /// * `None` - Nothing is scheduled
    pub fn time_until_next(&self) -> Option<I::Duration> {
        let due = self.next_due()?;
        let now = self.time_source.now();
        if due > now {
            Some(due.duration_since(now))
        } else {
            Some(I::Duration::ZERO)
        }
    }

    /// Returns the number of outstanding registrations.
    pub fn pending(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    fn earliest(entries: &[QueueEntry<I>]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, entry) in entries.iter().enumerate() {
            let Some(due) = entry.due else {
                continue;
            };
            let earlier = match best.and_then(|b| entries[b].due.map(|d| (d, entries[b].seq))) {
                None => true,
                Some((best_due, best_seq)) => {
                    due < best_due || (due == best_due && entry.seq < best_seq)
                }
            };
            if earlier {
                best = Some(idx);
            }
        }
        best
    }

    fn is_due(entry: &QueueEntry<I>, now: I) -> bool {
        entry.due.is_some_and(|due| due <= now)
    }

    fn bump_seq(&self) -> u32 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq.wrapping_add(1));
        seq
    }

    fn register(&self, firing: Firing, millis: u32, period_millis: Option<u32>) -> QueueHandle {
        let handle = QueueHandle(self.next_handle.get());
        self.next_handle.set(handle.0.wrapping_add(1));

        let due = self
            .time_source
            .now()
            .checked_add(I::Duration::from_millis(u64::from(millis)));
        let entry = QueueEntry {
            handle,
            firing,
            due,
            period_millis,
            seq: self.bump_seq(),
        };

        if self.entries.borrow_mut().push(entry).is_err() {
            panic!("QueueScheduler capacity of {} registrations exceeded", N);
        }

        handle
    }

    fn remove(&self, handle: QueueHandle) {
        if self.cancel_policy == CancelPolicy::Ignore {
            debug!("ignoring cancellation of entry {}", handle);
            return;
        }
        self.entries.borrow_mut().retain(|entry| entry.handle != handle);
    }
}

impl<I: TimeInstant, T: TimeSource<I>, const N: usize> HostScheduler
    for QueueScheduler<'_, I, T, N>
{
    type Handle = QueueHandle;

    /// # Panics
    /// If more than `N` registrations are outstanding.
    fn schedule_once(&self, firing: Firing, delay_millis: u32) -> QueueHandle {
        self.register(firing, delay_millis, None)
    }

    /// # Panics
    /// If more than `N` registrations are outstanding.
    fn schedule_repeating(&self, firing: Firing, period_millis: u32) -> QueueHandle {
        self.register(firing, period_millis, Some(period_millis))
    }

    fn cancel_once(&self, handle: QueueHandle) {
        self.remove(handle);
    }

    fn cancel_repeating(&self, handle: QueueHandle) {
        self.remove(handle);
    }
}
