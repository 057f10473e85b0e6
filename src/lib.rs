#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Timer`**: A unit of deferred work, scheduled once or repeatedly, that can be cancelled at any time
//! - **`TimerTask`**: Trait to implement for the work a timer performs when it fires
//! - **`TimerContext`**: Handed to `TimerTask::run` so a task can reschedule or cancel its own timer
//! - **`HostScheduler`**: Trait to implement for your platform's delayed-callback service
//! - **`Firing`**: The token a timer hands to its host; delivered back to `Timer::fire` when due
//! - **`TimerCollection`**: Routes commands and firings to a fixed set of timers by `TimerId`
//! - **`QueueScheduler`**: A polled `HostScheduler` for targets without a timer service
//! - **`TimeSource`**: Trait to implement for your timing system (used by `QueueScheduler`)
//!
//! Every cancellation, including the implicit one performed when a running
//! timer is rescheduled, advances the timer's cancellation epoch. Firings carry
//! the epoch they were scheduled under, so a host that delivers a firing after
//! it was asked to cancel it can never make a cancelled task run.

mod log;

pub mod collection;
pub mod command;
pub mod host;
pub mod scheduler;
pub mod time;
pub mod timer;
pub mod types;

pub use collection::{CollectionError, TimerCollection};
pub use command::{TimerAction, TimerCommand};
pub use host::HostScheduler;
pub use scheduler::{CancelPolicy, QueueHandle, QueueScheduler};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use timer::{FnTask, Timer, TimerContext, TimerTask};
pub use types::{Firing, TimerError, TimerId, TimerState};
