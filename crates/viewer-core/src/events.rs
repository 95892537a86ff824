//! Event queue between collaborators and the controller.
//!
//! Collaborators never call back into the controller directly. The engine's
//! flip handler, asset load continuations, and the resize debouncer all push
//! a [`ViewerEvent`] onto a shared [`EventQueue`]; the controller drains the
//! queue after every command and on every tick. This keeps the controller the
//! sole owner of session state while still giving each source a plain
//! callback to invoke.

use crate::assets::ImageSize;
use crate::engine::{FlipHandler, InstanceId};
use crate::error::AssetError;
use flipbook_scheduler::TaskId;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// The engine instance `instance` turned to `page_index` (0-based).
    PageChanged { instance: InstanceId, page_index: u32 },
    /// A resize burst went quiet.
    ViewportSettled,
    /// An asset load finished.
    AssetLoaded { task: TaskId, outcome: Result<ImageSize, AssetError> },
}

/// Shared FIFO of pending events. Clones push to the same queue.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<ViewerEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: ViewerEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn pop(&self) -> Option<ViewerEvent> {
        self.events.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Handler to subscribe to an engine's flip notifications.
    ///
    /// Events are tagged with `instance` so notifications from a destroyed
    /// instance can be told apart and dropped.
    pub fn flip_handler(&self, instance: InstanceId) -> FlipHandler {
        let queue = self.clone();
        Box::new(move |page_index| queue.push(ViewerEvent::PageChanged { instance, page_index }))
    }

    /// Continuation for the asset load registered as `task`.
    pub fn completer(&self, task: TaskId) -> LoadCompleter {
        LoadCompleter { task, queue: self.clone() }
    }
}

/// One-shot continuation handed to an asset loader.
///
/// Calling [`succeed`](Self::succeed) or [`fail`](Self::fail) consumes the
/// completer. Dropping it without calling either models a load that never
/// finishes; nothing is reported and nothing waits on it.
#[derive(Debug)]
pub struct LoadCompleter {
    task: TaskId,
    queue: EventQueue,
}

impl LoadCompleter {
    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn succeed(self, size: ImageSize) {
        self.complete(Ok(size));
    }

    pub fn fail(self, error: AssetError) {
        self.complete(Err(error));
    }

    pub fn complete(self, outcome: Result<ImageSize, AssetError>) {
        self.queue.push(ViewerEvent::AssetLoaded { task: self.task, outcome });
    }
}
