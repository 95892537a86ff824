//! Registry of in-flight asynchronous tasks
//!
//! Asynchronous work (image loads) is started elsewhere and reports back with
//! the [`TaskId`] it was given. The registry remembers what each task was for,
//! so the completion can be routed to the right continuation. Cancelled or
//! unknown tasks resolve to nothing, which is how stale completions are dropped.

use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a scheduled or in-flight task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tracks in-flight tasks and the purpose attached to each
///
/// # Example
///
/// ```
/// use flipbook_scheduler::TaskRegistry;
///
/// let mut registry = TaskRegistry::new();
/// let probe = registry.register("probe");
/// let stale = registry.register("background");
///
/// registry.cancel(stale);
///
/// assert_eq!(registry.complete(probe), Some("probe"));
/// assert_eq!(registry.complete(stale), None);
/// ```
#[derive(Debug)]
pub struct TaskRegistry<P> {
    tasks: HashMap<TaskId, P>,
    next_id: u64,
}

impl<P> TaskRegistry<P> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { tasks: HashMap::new(), next_id: 1 }
    }

    /// Register a new in-flight task and return its id
    pub fn register(&mut self, purpose: P) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(id, purpose);
        id
    }

    /// Resolve a completed task
    ///
    /// Returns the purpose the task was registered with, or `None` if the task
    /// was cancelled, already completed, or never registered.
    pub fn complete(&mut self, id: TaskId) -> Option<P> {
        self.tasks.remove(&id)
    }

    /// Cancel a task so its eventual completion is ignored
    ///
    /// Returns `true` if the task was still in flight.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    /// Cancel every in-flight task whose purpose matches `predicate`
    ///
    /// Returns the number of tasks cancelled.
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&P) -> bool,
    {
        let before = self.tasks.len();
        self.tasks.retain(|_, purpose| !predicate(purpose));
        before - self.tasks.len()
    }

    /// Whether the task is still in flight
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Number of in-flight tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is in flight
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<P> Default for TaskRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
