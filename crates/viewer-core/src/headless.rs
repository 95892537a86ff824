//! In-memory page-flip engine.
//!
//! [`HeadlessPageFlip`] follows the widget's navigation rules without drawing
//! anything, which is what the CLI and the tests drive. With a spread and a
//! cover, the front cover stands alone and every later pair of pages forms one
//! spread: `0 | 1-2 | 3-4 | ...`. In portrait mode every page stands alone.
//!
//! [`HeadlessFactory`] records every construction and destruction in an
//! [`EngineLedger`] and refuses to bind a second instance to a container that
//! still has a live one.

use crate::engine::{EngineFactory, FlipHandler, PageFlipEngine, RenderConfig};
use crate::error::EngineError;
use crate::mode::ViewerMode;
use crate::page::PageDescriptor;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Constructed { container: String, mode: ViewerMode },
    Destroyed { container: String },
}

#[derive(Debug, Default)]
struct LedgerState {
    history: Vec<LedgerEntry>,
    bound: HashSet<String>,
}

/// Shared record of instance lifecycles. Clones observe the same record.
#[derive(Debug, Clone, Default)]
pub struct EngineLedger {
    state: Rc<RefCell<LedgerState>>,
}

impl EngineLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constructed(&self) -> usize {
        self.count(|entry| matches!(entry, LedgerEntry::Constructed { .. }))
    }

    pub fn destroyed(&self) -> usize {
        self.count(|entry| matches!(entry, LedgerEntry::Destroyed { .. }))
    }

    /// Instances currently bound to any container.
    pub fn live(&self) -> usize {
        self.state.borrow().bound.len()
    }

    pub fn history(&self) -> Vec<LedgerEntry> {
        self.state.borrow().history.clone()
    }

    fn count(&self, predicate: impl Fn(&LedgerEntry) -> bool) -> usize {
        self.state.borrow().history.iter().filter(|entry| predicate(entry)).count()
    }

    fn bind(&self, container: &str, mode: ViewerMode) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        if !state.bound.insert(container.to_owned()) {
            return Err(EngineError::ContainerBusy { container: container.to_owned() });
        }

        state.history.push(LedgerEntry::Constructed { container: container.to_owned(), mode });
        Ok(())
    }

    fn release(&self, container: &str) {
        let mut state = self.state.borrow_mut();
        if state.bound.remove(container) {
            state.history.push(LedgerEntry::Destroyed { container: container.to_owned() });
        }
    }
}

pub struct HeadlessPageFlip {
    container: String,
    config: RenderConfig,
    pages: Vec<PageDescriptor>,
    current: u32,
    handlers: Vec<FlipHandler>,
    destroyed: bool,
    ledger: EngineLedger,
}

impl fmt::Debug for HeadlessPageFlip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessPageFlip")
            .field("container", &self.container)
            .field("mode", &self.config.mode())
            .field("pages", &self.pages.len())
            .field("current", &self.current)
            .field("handlers", &self.handlers.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl HeadlessPageFlip {
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn last_index(&self) -> Option<u32> {
        (self.pages.len() as u32).checked_sub(1)
    }

    /// First page of the view containing `page_index`.
    fn view_start(&self, page_index: u32) -> u32 {
        if self.config.use_portrait || page_index == 0 {
            page_index
        } else if page_index % 2 == 1 {
            page_index
        } else {
            page_index - 1
        }
    }

    fn turn_to(&mut self, page_index: u32) {
        if self.destroyed || page_index == self.current {
            return;
        }

        self.current = page_index;
        for handler in &mut self.handlers {
            handler(page_index);
        }
    }
}

impl PageFlipEngine for HeadlessPageFlip {
    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.destroyed = true;
        self.handlers.clear();
        self.pages.clear();
        self.ledger.release(&self.container);
    }

    fn load_pages(&mut self, pages: &[PageDescriptor]) {
        if self.destroyed {
            return;
        }

        self.pages = pages.to_vec();
        self.current = match self.last_index() {
            Some(last) => self.view_start(self.config.start_page.min(last)),
            None => 0,
        };
    }

    fn on_flip(&mut self, handler: FlipHandler) {
        if !self.destroyed {
            self.handlers.push(handler);
        }
    }

    fn flip_next(&mut self) {
        let Some(last) = self.last_index() else {
            return;
        };

        let next = if self.config.use_portrait || self.current == 0 {
            self.current + 1
        } else {
            self.current + 2
        };

        if next <= last {
            self.turn_to(next);
        }
    }

    fn flip_prev(&mut self) {
        if self.current == 0 {
            return;
        }

        let previous = if self.config.use_portrait || self.current <= 1 {
            self.current - 1
        } else {
            self.current - 2
        };

        self.turn_to(previous);
    }

    fn flip_to(&mut self, page_index: u32) {
        let Some(last) = self.last_index() else {
            return;
        };

        let target = self.view_start(page_index.min(last));
        self.turn_to(target);
    }

    fn current_page_index(&self) -> u32 {
        self.current
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }
}

/// Builds [`HeadlessPageFlip`] instances.
#[derive(Debug, Default)]
pub struct HeadlessFactory {
    ledger: EngineLedger,
    fail_next: Option<String>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> EngineLedger {
        self.ledger.clone()
    }

    /// Make the next construction fail with `reason`.
    pub fn fail_next_construction(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }
}

impl EngineFactory for HeadlessFactory {
    type Engine = HeadlessPageFlip;

    fn construct(&mut self, container: &str, config: &RenderConfig) -> Result<Self::Engine, EngineError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(EngineError::Construction(reason));
        }

        let valid = |value: f64| value.is_finite() && value > 0.0;
        if !valid(config.width) || !valid(config.height) {
            return Err(EngineError::InvalidConfig(format!(
                "page size {}x{} is not positive",
                config.width, config.height
            )));
        }

        self.ledger.bind(container, config.mode())?;

        Ok(HeadlessPageFlip {
            container: container.to_owned(),
            config: config.clone(),
            pages: Vec::new(),
            current: 0,
            handlers: Vec::new(),
            destroyed: false,
            ledger: self.ledger.clone(),
        })
    }
}
