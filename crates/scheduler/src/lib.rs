//! Flipbook Scheduler Library
//!
//! Single-threaded task primitives for the flipbook viewer's event loop.
//!
//! The viewer never blocks and never runs work in parallel. Everything that
//! happens "later" is expressed through the types in this crate:
//!
//! - [`Debouncer`] holds at most one scheduled evaluation. Every new signal
//!   cancels the outstanding one and schedules a fresh one after a quiet
//!   period, so only the latest request ever runs.
//! - [`TaskRegistry`] tracks in-flight asynchronous tasks (image loads) and the
//!   continuation each one should trigger when it completes. Cancelling a task
//!   removes it, so its late completion finds nothing to run.
//!
//! # Example
//!
//! ```
//! use flipbook_scheduler::Debouncer;
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut debouncer = Debouncer::new(Duration::from_millis(200));
//!
//! // A burst of resize signals.
//! debouncer.signal(start);
//! debouncer.signal(start + Duration::from_millis(50));
//! debouncer.signal(start + Duration::from_millis(120));
//!
//! // Nothing runs until 200ms after the last signal.
//! assert!(debouncer.poll(start + Duration::from_millis(250)).is_none());
//! assert!(debouncer.poll(start + Duration::from_millis(320)).is_some());
//! ```

mod debounce;
mod task;

pub use debounce::{Debouncer, ScheduledTask};
pub use task::{TaskId, TaskRegistry};
