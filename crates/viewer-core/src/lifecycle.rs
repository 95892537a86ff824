//! Ownership of the live engine instance.
//!
//! [`ViewerLifecycle`] is the only holder of an engine instance. Replacing the
//! instance always destroys the old one before constructing the new one, so
//! the page container never has two instances bound to it.

use crate::engine::{EngineFactory, InstanceId, PageFlipEngine, RenderConfig};
use crate::error::EngineError;
use crate::events::EventQueue;
use crate::page::PageDescriptor;
use log::debug;

/// The instance currently bound to the container.
#[derive(Debug)]
pub struct LiveInstance<E> {
    id: InstanceId,
    engine: E,
    config: RenderConfig,
}

impl<E: PageFlipEngine> LiveInstance<E> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

pub struct ViewerLifecycle<F: EngineFactory> {
    factory: F,
    container: String,
    live: Option<LiveInstance<F::Engine>>,
    next_instance: u64,
}

impl<F: EngineFactory> ViewerLifecycle<F> {
    pub fn new(factory: F, container: impl Into<String>) -> Self {
        Self { factory, container: container.into(), live: None, next_instance: 1 }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn live(&self) -> Option<&LiveInstance<F::Engine>> {
        self.live.as_ref()
    }

    pub fn live_mut(&mut self) -> Option<&mut LiveInstance<F::Engine>> {
        self.live.as_mut()
    }

    /// Whether `id` is the instance currently alive.
    pub fn is_live(&self, id: InstanceId) -> bool {
        self.live.as_ref().is_some_and(|live| live.id == id)
    }

    /// Replace the live instance with a new one built from `config`.
    ///
    /// The old instance is destroyed first, unconditionally. On construction
    /// failure no instance is left alive.
    pub fn reinitialize(
        &mut self,
        config: RenderConfig,
        pages: &[PageDescriptor],
        events: &EventQueue,
    ) -> Result<InstanceId, EngineError> {
        self.teardown();

        let mut engine = self.factory.construct(&self.container, &config)?;

        let id = InstanceId(self.next_instance);
        self.next_instance += 1;

        engine.load_pages(pages);
        engine.on_flip(events.flip_handler(id));

        debug!("{id} bound to `{}` in {} mode", self.container, config.mode());
        self.live = Some(LiveInstance { id, engine, config });

        Ok(id)
    }

    /// Destroy the live instance, if any. Returns `true` if one was destroyed.
    pub fn teardown(&mut self) -> bool {
        match self.live.take() {
            Some(mut live) => {
                live.engine.destroy();
                debug!("{} destroyed", live.id);
                true
            }
            None => false,
        }
    }
}

impl<F: EngineFactory> Drop for ViewerLifecycle<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
