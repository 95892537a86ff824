//! Viewport-mode controller for a page-flip document viewer.
//!
//! The crate decides between a two-page desktop layout and a single-page
//! mobile layout from the viewport width, fits the mobile page to the screen,
//! and owns the lifecycle of the page-flip engine instance that renders the
//! book. Rendering itself is behind [`PageFlipEngine`]; [`headless`] provides
//! an in-memory engine for hosts without a display and for tests.
//!
//! ```
//! use flipbook_core::headless::HeadlessFactory;
//! use flipbook_core::{ImageSize, LoadCompleter, AssetLoader, ContentRef};
//! use flipbook_core::{ViewerConfig, ViewerController, ViewerMode, ViewportMetrics};
//!
//! struct FixedSize;
//!
//! impl AssetLoader for FixedSize {
//!     fn load(&mut self, _asset: &ContentRef, done: LoadCompleter) {
//!         done.succeed(ImageSize::new(707, 1000));
//!     }
//! }
//!
//! let mut viewer = ViewerController::new(
//!     ViewerConfig::default(),
//!     HeadlessFactory::new(),
//!     FixedSize,
//!     ViewportMetrics::new(1280.0, 800.0),
//! )?;
//! viewer.start()?;
//! viewer.navigate_next()?;
//!
//! assert_eq!(viewer.session().mode(), Some(ViewerMode::Desktop));
//! assert_eq!(viewer.session().current_page_number(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assets;
pub mod config;
pub mod controller;
pub mod display;
pub mod engine;
pub mod error;
pub mod events;
pub mod fit;
pub mod headless;
pub mod lifecycle;
pub mod mode;
pub mod navigation;
pub mod page;
pub mod session;
pub mod zoom;

pub use assets::{AssetLoader, ImageSize, LoadPurpose};
pub use config::ViewerConfig;
pub use controller::ViewerController;
pub use display::{PageInput, ViewerDisplay};
pub use engine::{EngineFactory, InstanceId, PageFlipEngine, RenderConfig, SizeMode};
pub use error::{AssetError, ConfigError, EngineError, ViewerError, ViewerResult};
pub use events::{EventQueue, LoadCompleter, ViewerEvent};
pub use fit::{fit_mobile_page, fit_to_box, BindingEdge, FitMargins, FittedSize, ViewportMetrics};
pub use mode::{detect_mode, ModeDecision, ModeDetector, ViewerMode, MOBILE_BREAKPOINT_PX};
pub use page::{AssetPaths, ContentRef, PageBuilder, PageDescriptor, PageKind};
pub use session::ViewerSession;
pub use zoom::{ZoomController, ZoomState};
