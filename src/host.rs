//! The host scheduling contract.
//!
//! Defines the [`HostScheduler`] trait that a [`Timer`](crate::Timer)
//! registers with. The host owns the actual delay queue (a browser event
//! loop, an RTOS timer service, [`QueueScheduler`](crate::QueueScheduler),
//! ...); timers never look inside its handles.

use crate::types::Firing;

/// Trait for abstracting the host's delayed-callback primitives.
///
/// Implement this for your platform's timer service. When a registration
/// elapses, deliver its [`Firing`] back to the timer with
/// [`Timer::fire`](crate::Timer::fire) (or through
/// [`TimerCollection::dispatch`](crate::TimerCollection::dispatch)).
///
/// All methods take `&self`: hosts are shared between timers on a single
/// thread and are expected to use interior mutability.
///
/// Cancellation is best effort. A host may still deliver a firing after it
/// was asked to cancel it; the timer drops such firings on its own.
pub trait HostScheduler {
    /// Opaque handle identifying a single registration.
    type Handle: Copy;

    /// Registers `firing` to be delivered once, `delay_millis` from now.
    fn schedule_once(&self, firing: Firing, delay_millis: u32) -> Self::Handle;

    /// Registers `firing` to be delivered every `period_millis` (never zero).
    fn schedule_repeating(&self, firing: Firing, period_millis: u32) -> Self::Handle;

    /// Asks the host to drop a one-shot registration. Must tolerate handles
    /// that have already been delivered.
    fn cancel_once(&self, handle: Self::Handle);

    /// Asks the host to drop a repeating registration.
    fn cancel_repeating(&self, handle: Self::Handle);
}
