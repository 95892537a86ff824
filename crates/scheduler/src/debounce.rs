//! Cancel-and-reschedule debouncing
//!
//! Resize events arrive in bursts. The [`Debouncer`] keeps a single pending
//! [`ScheduledTask`]; each new signal replaces it with one due `quiet_period`
//! after the signal. Only a task that survives the whole quiet period is
//! handed back by [`Debouncer::poll`].
//!
//! Time is passed in explicitly so the host event loop (or a test) decides
//! what "now" is.

use crate::TaskId;
use log::trace;
use std::time::{Duration, Instant};

/// A pending evaluation scheduled by the debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Identifier of this scheduling, unique per debouncer
    pub id: TaskId,

    /// Earliest instant at which the task may run
    pub due: Instant,
}

/// Latest-wins debouncer with a fixed quiet period
#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    pending: Option<ScheduledTask>,
    next_id: u64,
}

impl Debouncer {
    /// Create a debouncer that waits `quiet_period` after the last signal.
    pub fn new(quiet_period: Duration) -> Self {
        Self { quiet_period, pending: None, next_id: 1 }
    }

    /// Record a signal at `now`.
    ///
    /// Replaces any outstanding task with a new one due at
    /// `now + quiet_period`. Returns the new task's id.
    pub fn signal(&mut self, now: Instant) -> TaskId {
        if let Some(previous) = self.pending.take() {
            trace!("debounce: task {} superseded", previous.id);
        }

        let id = TaskId(self.next_id);
        self.next_id += 1;

        self.pending = Some(ScheduledTask { id, due: now + self.quiet_period });

        id
    }

    /// Take the pending task if it is due at `now`.
    ///
    /// Returns `None` while the quiet period is still running or when nothing
    /// is scheduled. A returned task is no longer pending.
    pub fn poll(&mut self, now: Instant) -> Option<ScheduledTask> {
        match self.pending {
            Some(task) if task.due <= now => self.pending.take(),
            _ => None,
        }
    }

    /// Drop the pending task, if any, without scheduling a new one.
    ///
    /// Returns `true` if a task was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// When the pending task becomes due, if one is scheduled
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|task| task.due)
    }
}
