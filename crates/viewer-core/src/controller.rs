//! The viewport mode controller.
//!
//! [`ViewerController`] is what a UI shell talks to. It owns the session, the
//! live engine instance, the resize debouncer and all in-flight asset loads,
//! and it exposes the shell's commands: start, initialize, resize, navigate,
//! jump, and zoom.
//!
//! Every command finishes by draining the [`EventQueue`], so flip
//! notifications and load completions produced while handling a command are
//! processed before the command returns. Hosts with real asynchronous loads
//! call [`ViewerController::dispatch`] (or [`ViewerController::tick`]) from
//! their event loop to process completions that arrive later.

use crate::assets::{AssetLoader, LoadPurpose};
use crate::config::ViewerConfig;
use crate::display::ViewerDisplay;
use crate::engine::{EngineFactory, InstanceId, PageFlipEngine, RenderConfig};
use crate::error::{ConfigError, ViewerError, ViewerResult};
use crate::events::{EventQueue, ViewerEvent};
use crate::fit::{fit_mobile_page, FitMargins, FittedSize, ViewportMetrics};
use crate::lifecycle::ViewerLifecycle;
use crate::mode::{ModeDecision, ModeDetector, ViewerMode};
use crate::navigation::{apply_position, BackgroundSync, Position};
use crate::page::{AssetPaths, PageBuilder};
use crate::session::ViewerSession;
use crate::zoom::{ZoomController, ZoomState};
use flipbook_scheduler::{Debouncer, TaskRegistry};
use log::{debug, info, warn};
use std::time::Instant;

/// Fitted sizes closer than this are treated as unchanged by a re-fit.
const REFIT_TOLERANCE_PX: f64 = 0.5;

pub struct ViewerController<F: EngineFactory, L: AssetLoader> {
    config: ViewerConfig,
    session: ViewerSession,
    display: ViewerDisplay,
    detector: ModeDetector,
    zoom: ZoomController,
    pages: PageBuilder,
    lifecycle: ViewerLifecycle<F>,
    loader: L,
    events: EventQueue,
    loads: TaskRegistry<LoadPurpose>,
    background: BackgroundSync,
    resize: Debouncer,
    viewport: ViewportMetrics,
    fitted: Option<FittedSize>,
    started: bool,
}

impl<F: EngineFactory, L: AssetLoader> ViewerController<F, L> {
    /// Create a controller for a viewport of the given size.
    ///
    /// # Errors
    /// Returns an error if `config` fails [`ViewerConfig::validate`].
    pub fn new(
        config: ViewerConfig,
        factory: F,
        loader: L,
        viewport: ViewportMetrics,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let document = &config.document;

        Ok(Self {
            session: ViewerSession::new(document.total_pages, document.default_aspect_ratio),
            display: ViewerDisplay::default(),
            detector: ModeDetector::new(config.layout.mobile_breakpoint_px),
            zoom: ZoomController::new(&config.zoom),
            pages: PageBuilder::new(document.total_pages, AssetPaths::from_config(document)),
            lifecycle: ViewerLifecycle::new(factory, document.container_id.clone()),
            loader,
            events: EventQueue::new(),
            loads: TaskRegistry::new(),
            background: BackgroundSync::new(),
            resize: Debouncer::new(config.layout.resize_debounce()),
            viewport,
            fitted: None,
            started: false,
            config,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    pub fn display(&self) -> &ViewerDisplay {
        &self.display
    }

    pub fn viewport(&self) -> ViewportMetrics {
        self.viewport
    }

    pub fn factory(&self) -> &F {
        self.lifecycle.factory()
    }

    pub fn factory_mut(&mut self) -> &mut F {
        self.lifecycle.factory_mut()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Id of the live engine instance, if one is alive.
    pub fn live_instance(&self) -> Option<InstanceId> {
        self.lifecycle.live().map(|live| live.id())
    }

    /// Configuration the live instance was built with.
    pub fn render_config(&self) -> Option<&RenderConfig> {
        self.lifecycle.live().map(|live| live.config())
    }

    pub fn engine(&self) -> Option<&F::Engine> {
        self.lifecycle.live().map(|live| live.engine())
    }

    /// When the pending resize evaluation becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.resize.next_deadline()
    }

    /// Number of asset loads still in flight.
    pub fn pending_loads(&self) -> usize {
        self.loads.len()
    }

    /// Start the viewer: probe the first page's aspect ratio, then initialize.
    ///
    /// Initialization runs once the probe completes, whether it succeeds or
    /// fails. If the loader completes synchronously that happens before this
    /// returns. Calling `start` again has no effect.
    pub fn start(&mut self) -> ViewerResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let asset = self.pages.paths().page(1);
        let task = self.loads.register(LoadPurpose::AspectProbe);
        debug!("probing aspect ratio from {asset}");
        self.loader.load(&asset, self.events.completer(task));

        self.dispatch()
    }

    /// Evaluate the current viewport immediately.
    ///
    /// `forced` rebuilds the instance even if the mode did not change.
    pub fn initialize(&mut self, forced: bool) -> ViewerResult<()> {
        self.evaluate_viewport(forced)?;
        self.dispatch()
    }

    /// Record a resize. Evaluation waits until resizing has been quiet for
    /// the configured period; see [`tick`](Self::tick).
    pub fn on_resize(&mut self, viewport: ViewportMetrics, now: Instant) {
        self.viewport = viewport;
        let task = self.resize.signal(now);
        debug!("resize to {}x{} scheduled as {task}", viewport.width, viewport.height);
    }

    /// Run a due resize evaluation and process pending events.
    pub fn tick(&mut self, now: Instant) -> ViewerResult<()> {
        if self.resize.poll(now).is_some() {
            self.events.push(ViewerEvent::ViewportSettled);
        }

        self.dispatch()
    }

    pub fn navigate_next(&mut self) -> ViewerResult<()> {
        match self.lifecycle.live_mut() {
            Some(live) => live.engine_mut().flip_next(),
            None => debug!("next ignored: no live instance"),
        }

        self.dispatch()
    }

    pub fn navigate_previous(&mut self) -> ViewerResult<()> {
        match self.lifecycle.live_mut() {
            Some(live) => live.engine_mut().flip_prev(),
            None => debug!("previous ignored: no live instance"),
        }

        self.dispatch()
    }

    /// Turn to the 1-based `page`.
    pub fn jump_to_page(&mut self, page: u32) -> ViewerResult<()> {
        let total = self.session.total_pages();
        if page == 0 || page > total {
            return Err(ViewerError::PageOutOfRange { page, total });
        }

        match self.lifecycle.live_mut() {
            Some(live) => live.engine_mut().flip_to(page - 1),
            None => debug!("jump to {page} ignored: no live instance"),
        }

        self.dispatch()
    }

    pub fn zoom_in(&mut self) -> &ZoomState {
        self.display.zoom = self.zoom.zoom_in(&mut self.session);
        &self.display.zoom
    }

    pub fn zoom_out(&mut self) -> &ZoomState {
        self.display.zoom = self.zoom.zoom_out(&mut self.session);
        &self.display.zoom
    }

    /// Process every queued event.
    ///
    /// Stops at the first error; events behind it stay queued for the next call.
    pub fn dispatch(&mut self) -> ViewerResult<()> {
        while let Some(event) = self.events.pop() {
            self.handle_event(event)?;
        }

        Ok(())
    }

    /// Destroy the live instance and drop all pending work.
    pub fn shutdown(&mut self) {
        self.resize.cancel();
        self.loads.cancel_where(|_| true);
        self.lifecycle.teardown();
        while self.events.pop().is_some() {}
    }

    fn handle_event(&mut self, event: ViewerEvent) -> ViewerResult<()> {
        match event {
            ViewerEvent::PageChanged { instance, page_index } => {
                if self.lifecycle.is_live(instance) {
                    debug!("{instance} turned to page index {page_index}");
                    self.sync_position();
                } else {
                    debug!("dropping flip from destroyed {instance}");
                }
                Ok(())
            }
            ViewerEvent::ViewportSettled => self.evaluate_viewport(false),
            ViewerEvent::AssetLoaded { task, outcome } => match self.loads.complete(task) {
                Some(LoadPurpose::AspectProbe) => {
                    match outcome.as_ref().ok().and_then(|size| size.aspect_ratio()) {
                        Some(ratio) if self.session.set_first_asset_ratio(ratio) => {
                            info!("page aspect ratio {ratio:.4}");
                        }
                        _ => warn!(
                            "aspect probe failed, using default ratio {}",
                            self.session.first_asset_ratio()
                        ),
                    }
                    // A late aspect result only re-fits; forcing would reset the page.
                    let forced = !self.session.is_initialized();
                    self.evaluate_viewport(forced)
                }
                Some(LoadPurpose::Background(asset)) => {
                    self.background.complete(task, asset, outcome, &mut self.display);
                    Ok(())
                }
                None => {
                    debug!("dropping completion of stale load {task}");
                    Ok(())
                }
            },
        }
    }

    fn evaluate_viewport(&mut self, forced: bool) -> ViewerResult<()> {
        let had_mode = self.session.is_initialized();
        let decision = self.detector.evaluate(
            &mut self.session,
            self.viewport,
            forced,
            self.lifecycle.live().is_some(),
        );

        match decision {
            ModeDecision::Rebuild(mode) => {
                let start_page = if had_mode && self.config.layout.preserve_page_on_rebuild {
                    self.session.current_page_index()
                } else {
                    0
                };
                self.rebuild(mode, start_page)
            }
            ModeDecision::Refit => self.refit(),
            ModeDecision::Unchanged => Ok(()),
        }
    }

    /// Recompute the mobile fit and rebuild only if the size changed.
    ///
    /// The rebuilt instance starts on the current page.
    fn refit(&mut self) -> ViewerResult<()> {
        let fitted = self.fit();
        if self.fitted.is_some_and(|current| current.approx_eq(&fitted, REFIT_TOLERANCE_PX)) {
            debug!("re-fit: {}x{} unchanged", fitted.width, fitted.height);
            return Ok(());
        }

        let start_page = self.session.current_page_index();
        self.rebuild(ViewerMode::Mobile, start_page)
    }

    fn rebuild(&mut self, mode: ViewerMode, start_page: u32) -> ViewerResult<()> {
        let pages = self.pages.build();

        let render = match mode {
            ViewerMode::Desktop => {
                self.fitted = None;
                RenderConfig::desktop(&self.config.desktop, start_page)
            }
            ViewerMode::Mobile => {
                let fitted = self.fit();
                self.fitted = Some(fitted);
                RenderConfig::mobile(&self.config.mobile, fitted, start_page)
            }
        };

        match self.lifecycle.reinitialize(render, &pages, &self.events) {
            Ok(instance) => {
                info!("{mode} layout ready ({instance}, start page {start_page})");
                self.sync_position();
                Ok(())
            }
            Err(source) => {
                warn!("{mode} layout failed: {source}");
                self.fitted = None;
                Err(ViewerError::Initialization { mode, source })
            }
        }
    }

    fn fit(&self) -> FittedSize {
        let margins = FitMargins {
            horizontal: self.config.layout.mobile_margin_x,
            vertical: self.config.layout.mobile_margin_y,
        };
        fit_mobile_page(self.viewport, margins, self.session.first_asset_ratio())
    }

    fn sync_position(&mut self) {
        let Some(mode) = self.session.mode() else {
            return;
        };
        let Some(position) = self.lifecycle.live().map(|live| Position::read(live.engine())) else {
            return;
        };

        apply_position(mode, position, &mut self.session, &mut self.display);

        let asset = self.pages.paths().page(self.session.current_page_number());
        self.background.request(asset, &self.display, &mut self.loads, &mut self.loader, &self.events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssetError, EngineError};
    use crate::events::LoadCompleter;
    use crate::headless::{HeadlessFactory, LedgerEntry};
    use crate::page::ContentRef;
    use crate::{display::PageInput, ImageSize};
    use std::time::Duration;

    /// Loader that answers immediately from a fixed table.
    #[derive(Default)]
    struct InstantLoader {
        probe: Option<ImageSize>,
        failing: Vec<String>,
        requested: Vec<ContentRef>,
    }

    impl AssetLoader for InstantLoader {
        fn load(&mut self, asset: &ContentRef, done: LoadCompleter) {
            self.requested.push(asset.clone());
            if self.failing.iter().any(|path| path == asset.as_str()) {
                done.fail(AssetError::NotFound(asset.to_string()));
            } else if asset.as_str().ends_with("page_1.webp") {
                match self.probe {
                    Some(size) => done.succeed(size),
                    None => done.fail(AssetError::NotFound(asset.to_string())),
                }
            } else {
                done.succeed(ImageSize::new(707, 1000));
            }
        }
    }

    /// Loader that holds completions until the test releases them.
    #[derive(Default)]
    struct HeldLoader {
        held: Vec<(ContentRef, LoadCompleter)>,
    }

    impl AssetLoader for HeldLoader {
        fn load(&mut self, asset: &ContentRef, done: LoadCompleter) {
            self.held.push((asset.clone(), done));
        }
    }

    type Controller<L> = ViewerController<HeadlessFactory, L>;

    fn controller(width: f64, height: f64) -> Controller<InstantLoader> {
        let loader = InstantLoader { probe: Some(ImageSize::new(707, 1000)), ..InstantLoader::default() };
        ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            loader,
            ViewportMetrics::new(width, height),
        )
        .expect("config should be valid")
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_start_probes_then_initializes_desktop() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start should succeed");

        assert_eq!(viewer.session().mode(), Some(ViewerMode::Desktop));
        assert_eq!(viewer.loader().requested[0].as_str(), "ebook/page_1.webp");
        assert!((viewer.session().first_asset_ratio() - 0.707).abs() < 1e-9);
        assert_eq!(viewer.factory().ledger().live(), 1);
        assert_eq!(viewer.display().page_input, Some(PageInput { value: 1, max: 44 }));
        assert_eq!(viewer.display().page_label.as_deref(), Some(" / 44"));
        assert!(!viewer.display().book_open);
        assert_eq!(viewer.display().background, Some(ContentRef::new("ebook/page_1.webp")));
    }

    #[test]
    fn test_probe_failure_uses_default_ratio() {
        let loader = InstantLoader::default();
        let mut viewer = ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            loader,
            ViewportMetrics::new(400.0, 800.0),
        )
        .expect("config should be valid");

        viewer.start().expect("start should succeed");

        assert_eq!(viewer.session().first_asset_ratio(), 0.707);
        assert_eq!(viewer.session().mode(), Some(ViewerMode::Mobile));
        let render = viewer.render_config().expect("live instance");
        assert_eq!(render.width, 380.0);
        assert!((render.height - 380.0 / 0.707).abs() < 1e-9);
    }

    #[test]
    fn test_probe_ratio_drives_mobile_fit() {
        let loader = InstantLoader { probe: Some(ImageSize::new(600, 800)), ..InstantLoader::default() };
        let mut viewer = ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            loader,
            ViewportMetrics::new(420.0, 900.0),
        )
        .expect("config should be valid");

        viewer.start().expect("start should succeed");

        let render = viewer.render_config().expect("live instance");
        assert_eq!(render.width, 400.0);
        assert!((render.height - 400.0 / 0.75).abs() < 1e-9);
        assert!(render.use_portrait);
    }

    #[test]
    fn test_hung_probe_leaves_viewer_waiting() {
        let mut viewer = ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            HeldLoader::default(),
            ViewportMetrics::new(1280.0, 800.0),
        )
        .expect("config should be valid");

        viewer.start().expect("start should succeed");
        assert_eq!(viewer.session().mode(), None);
        assert_eq!(viewer.pending_loads(), 1);

        // The shell can still force an initialization.
        viewer.initialize(true).expect("initialize should succeed");
        assert_eq!(viewer.session().mode(), Some(ViewerMode::Desktop));
    }

    #[test]
    fn test_late_aspect_result_keeps_desktop_position() {
        let mut viewer = ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            HeldLoader::default(),
            ViewportMetrics::new(1280.0, 800.0),
        )
        .expect("config should be valid");
        viewer.start().expect("start");
        viewer.initialize(true).expect("initialize");
        viewer.jump_to_page(20).expect("jump");
        let instance = viewer.live_instance();

        let (_, probe) = viewer.loader_mut().held.remove(0);
        probe.succeed(ImageSize::new(600, 800));
        viewer.dispatch().expect("dispatch");

        assert_eq!(viewer.session().current_page_index(), 19);
        assert_eq!(viewer.session().first_asset_ratio(), 0.75);
        assert_eq!(viewer.live_instance(), instance);
        assert_eq!(viewer.factory().ledger().constructed(), 1);
    }

    #[test]
    fn test_late_aspect_result_refits_mobile_at_current_page() {
        let mut viewer = ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            HeldLoader::default(),
            ViewportMetrics::new(420.0, 900.0),
        )
        .expect("config should be valid");
        viewer.start().expect("start");
        viewer.initialize(true).expect("initialize");
        viewer.jump_to_page(6).expect("jump");

        let (_, probe) = viewer.loader_mut().held.remove(0);
        probe.succeed(ImageSize::new(600, 800));
        viewer.dispatch().expect("dispatch");

        let render = viewer.render_config().expect("live instance");
        assert_eq!(render.width, 400.0);
        assert!((render.height - 400.0 / 0.75).abs() < 1e-9);
        assert_eq!(render.start_page, 5);
        assert_eq!(viewer.session().current_page_index(), 5);
        assert_eq!(viewer.factory().ledger().constructed(), 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ViewerConfig::default();
        config.desktop.width = 0.0;

        let result = ViewerController::new(
            config,
            HeadlessFactory::new(),
            InstantLoader::default(),
            ViewportMetrics::new(1280.0, 800.0),
        );

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_navigate_to_last_page() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");

        for _ in 0..30 {
            viewer.navigate_next().expect("next");
        }

        assert_eq!(viewer.session().current_page_index(), 43);
        assert_eq!(viewer.display().page_input, Some(PageInput { value: 44, max: 44 }));
        assert!(viewer.display().book_open);
        assert_eq!(viewer.display().background, Some(ContentRef::new("ebook/page_44.webp")));
    }

    #[test]
    fn test_mobile_navigation_updates_compact_indicator() {
        let mut viewer = controller(400.0, 800.0);
        viewer.start().expect("start");

        viewer.navigate_next().expect("next");
        viewer.navigate_next().expect("next");
        viewer.navigate_previous().expect("previous");

        assert_eq!(viewer.display().compact_indicator.as_deref(), Some("2 / 44"));
        assert_eq!(viewer.display().page_input, None);
        assert_eq!(viewer.session().current_page_index(), 1);
    }

    #[test]
    fn test_jump_to_page_validates_range() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");

        viewer.jump_to_page(10).expect("jump");
        assert_eq!(viewer.session().current_page_index(), 9);

        assert!(matches!(
            viewer.jump_to_page(45),
            Err(ViewerError::PageOutOfRange { page: 45, total: 44 })
        ));
        assert!(matches!(viewer.jump_to_page(0), Err(ViewerError::PageOutOfRange { .. })));
        assert_eq!(viewer.session().current_page_index(), 9);
    }

    #[test]
    fn test_desktop_to_mobile_destroys_once_before_constructing() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");
        let ledger = viewer.factory().ledger();
        let start = Instant::now();

        viewer.on_resize(ViewportMetrics::new(500.0, 800.0), start);
        viewer.tick(start + ms(200)).expect("tick");

        assert_eq!(viewer.session().mode(), Some(ViewerMode::Mobile));
        assert_eq!(
            ledger.history(),
            vec![
                LedgerEntry::Constructed { container: "book".to_owned(), mode: ViewerMode::Desktop },
                LedgerEntry::Destroyed { container: "book".to_owned() },
                LedgerEntry::Constructed { container: "book".to_owned(), mode: ViewerMode::Mobile },
            ]
        );
        assert_eq!(ledger.live(), 1);
    }

    #[test]
    fn test_resize_burst_evaluates_latest_viewport_once() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");
        let ledger = viewer.factory().ledger();
        let start = Instant::now();

        viewer.on_resize(ViewportMetrics::new(500.0, 800.0), start);
        viewer.tick(start + ms(100)).expect("tick");
        viewer.on_resize(ViewportMetrics::new(700.0, 800.0), start + ms(150));
        viewer.on_resize(ViewportMetrics::new(1100.0, 800.0), start + ms(300));
        viewer.tick(start + ms(450)).expect("tick");

        assert_eq!(viewer.session().mode(), Some(ViewerMode::Desktop));
        assert_eq!(ledger.constructed(), 1);

        viewer.tick(start + ms(500)).expect("tick");
        assert_eq!(viewer.session().mode(), Some(ViewerMode::Desktop));
        assert_eq!(ledger.constructed(), 1);
        assert_eq!(viewer.next_deadline(), None);
    }

    #[test]
    fn test_mode_switch_resets_page_but_keeps_zoom() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");
        viewer.jump_to_page(20).expect("jump");
        viewer.zoom_in();
        viewer.zoom_in();
        let start = Instant::now();

        viewer.on_resize(ViewportMetrics::new(400.0, 800.0), start);
        viewer.tick(start + ms(200)).expect("tick");

        assert_eq!(viewer.session().current_page_index(), 0);
        assert_eq!(viewer.session().scale_percent(), 120);
        assert_eq!(viewer.display().zoom.label, "120%");
    }

    #[test]
    fn test_preserve_page_on_rebuild() {
        let mut config = ViewerConfig::default();
        config.layout.preserve_page_on_rebuild = true;
        let loader = InstantLoader { probe: Some(ImageSize::new(707, 1000)), ..InstantLoader::default() };
        let mut viewer = ViewerController::new(
            config,
            HeadlessFactory::new(),
            loader,
            ViewportMetrics::new(1280.0, 800.0),
        )
        .expect("config should be valid");
        viewer.start().expect("start");
        viewer.jump_to_page(20).expect("jump");
        let start = Instant::now();

        viewer.on_resize(ViewportMetrics::new(400.0, 800.0), start);
        viewer.tick(start + ms(200)).expect("tick");

        assert_eq!(viewer.session().current_page_index(), 19);
        assert_eq!(viewer.render_config().map(|render| render.start_page), Some(19));
    }

    #[test]
    fn test_same_size_mobile_resize_is_idempotent() {
        let mut viewer = controller(400.0, 800.0);
        viewer.start().expect("start");
        let ledger = viewer.factory().ledger();
        let instance = viewer.live_instance();
        let start = Instant::now();

        viewer.on_resize(ViewportMetrics::new(400.0, 800.0), start);
        viewer.tick(start + ms(200)).expect("tick");

        assert_eq!(viewer.live_instance(), instance);
        assert_eq!(ledger.constructed(), 1);
    }

    #[test]
    fn test_mobile_refit_keeps_page_and_session() {
        let mut viewer = controller(400.0, 800.0);
        viewer.start().expect("start");
        viewer.jump_to_page(5).expect("jump");
        viewer.zoom_out();
        let start = Instant::now();

        viewer.on_resize(ViewportMetrics::new(360.0, 800.0), start);
        viewer.tick(start + ms(200)).expect("tick");

        let render = viewer.render_config().expect("live instance");
        assert_eq!(render.width, 340.0);
        assert_eq!(render.start_page, 4);
        assert_eq!(viewer.session().current_page_index(), 4);
        assert_eq!(viewer.session().scale_percent(), 90);
        assert_eq!(viewer.factory().ledger().constructed(), 2);
        assert_eq!(viewer.factory().ledger().live(), 1);
    }

    #[test]
    fn test_stale_flip_events_are_dropped() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");
        let stale = viewer.live_instance().expect("live instance");

        viewer.initialize(true).expect("rebuild");
        viewer.jump_to_page(10).expect("jump");
        viewer.events.push(ViewerEvent::PageChanged { instance: stale, page_index: 30 });
        viewer.dispatch().expect("dispatch");

        assert_ne!(viewer.live_instance(), Some(stale));
        assert_eq!(viewer.session().current_page_index(), 9);
    }

    #[test]
    fn test_construction_failure_is_fatal_until_next_evaluation() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");
        viewer.factory_mut().fail_next_construction("context lost");

        let result = viewer.initialize(true);
        assert!(matches!(
            result,
            Err(ViewerError::Initialization { mode: ViewerMode::Desktop, source: EngineError::Construction(_) })
        ));
        assert_eq!(viewer.live_instance(), None);
        assert_eq!(viewer.factory().ledger().live(), 0);

        // Navigation is a no-op without an instance.
        viewer.navigate_next().expect("next");

        // A same-mode resize recovers because nothing is alive.
        let start = Instant::now();
        viewer.on_resize(ViewportMetrics::new(1300.0, 800.0), start);
        viewer.tick(start + ms(200)).expect("tick");
        assert!(viewer.live_instance().is_some());
    }

    #[test]
    fn test_background_preload_failure_keeps_previous() {
        let loader = InstantLoader {
            probe: Some(ImageSize::new(707, 1000)),
            failing: vec!["ebook/page_2.webp".to_owned()],
            ..InstantLoader::default()
        };
        let mut viewer = ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            loader,
            ViewportMetrics::new(1280.0, 800.0),
        )
        .expect("config should be valid");
        viewer.start().expect("start");

        viewer.navigate_next().expect("next");

        assert_eq!(viewer.session().current_page_index(), 1);
        assert_eq!(viewer.display().background, Some(ContentRef::new("ebook/page_1.webp")));
    }

    #[test]
    fn test_slow_background_for_left_page_never_swaps() {
        let mut viewer = ViewerController::new(
            ViewerConfig::default(),
            HeadlessFactory::new(),
            HeldLoader::default(),
            ViewportMetrics::new(1280.0, 800.0),
        )
        .expect("config should be valid");
        viewer.start().expect("start");
        let (_, probe) = viewer.loader_mut().held.remove(0);
        probe.succeed(ImageSize::new(707, 1000));
        viewer.dispatch().expect("dispatch");

        viewer.navigate_next().expect("next");
        viewer.navigate_next().expect("next");

        let held: Vec<_> = viewer.loader_mut().held.drain(..).collect();
        let paths: Vec<_> = held.iter().map(|(asset, _)| asset.to_string()).collect();
        assert_eq!(paths, ["ebook/page_1.webp", "ebook/page_2.webp", "ebook/page_4.webp"]);

        // Complete in reverse order: only the latest request may swap.
        for (_, done) in held.into_iter().rev() {
            done.succeed(ImageSize::new(707, 1000));
        }
        viewer.dispatch().expect("dispatch");

        assert_eq!(viewer.display().background, Some(ContentRef::new("ebook/page_4.webp")));
        assert_eq!(viewer.pending_loads(), 0);
    }

    #[test]
    fn test_zoom_never_rebuilds() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");
        let instance = viewer.live_instance();

        for _ in 0..25 {
            viewer.zoom_in();
        }
        let state = viewer.zoom_out().clone();

        assert_eq!(state.label, "290%");
        assert_eq!(viewer.live_instance(), instance);
        assert_eq!(viewer.factory().ledger().constructed(), 1);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut viewer = controller(1280.0, 800.0);
        viewer.start().expect("start");
        viewer.on_resize(ViewportMetrics::new(500.0, 800.0), Instant::now());

        viewer.shutdown();

        assert_eq!(viewer.live_instance(), None);
        assert_eq!(viewer.next_deadline(), None);
        assert_eq!(viewer.factory().ledger().live(), 0);
    }
}
