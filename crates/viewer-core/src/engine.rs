//! Page-flip engine contract.
//!
//! The engine is an external widget: it owns page-flip visuals and tracks
//! which page is showing. The core drives it through [`PageFlipEngine`] and
//! creates instances through an [`EngineFactory`]. Everything the engine
//! needs to know about a layout is in a [`RenderConfig`], built fresh for
//! every instance.

use crate::config::{DesktopConfig, MobileConfig};
use crate::error::EngineError;
use crate::fit::FittedSize;
use crate::mode::ViewerMode;
use crate::page::PageDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one engine instance over the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// Handler invoked with the new 0-based page index after every flip.
pub type FlipHandler = Box<dyn FnMut(u32)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Scale within the min/max bounds to fill the container
    Stretch,
    /// Use `width` × `height` exactly
    Fixed,
}

/// Engine configuration for one instance. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub size: SizeMode,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_shadow_opacity: Option<f64>,
    pub show_cover: bool,
    pub mobile_scroll_support: bool,
    /// Single page when `true`, two-page spread when `false`
    pub use_portrait: bool,
    pub start_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flipping_time: Option<u32>,
}

impl RenderConfig {
    /// Two-page spread that stretches within the configured bounds.
    pub fn desktop(desktop: &DesktopConfig, start_page: u32) -> Self {
        Self {
            width: desktop.width,
            height: desktop.height,
            size: SizeMode::Stretch,
            min_width: desktop.min_width,
            max_width: desktop.max_width,
            min_height: desktop.min_height,
            max_height: desktop.max_height,
            max_shadow_opacity: Some(desktop.max_shadow_opacity),
            show_cover: true,
            mobile_scroll_support: false,
            use_portrait: false,
            start_page,
            flipping_time: None,
        }
    }

    /// Single page at exactly the fitted size, with a slower flip.
    pub fn mobile(mobile: &MobileConfig, fitted: FittedSize, start_page: u32) -> Self {
        Self {
            width: fitted.width,
            height: fitted.height,
            size: SizeMode::Fixed,
            min_width: mobile.min_width,
            max_width: mobile.max_width,
            min_height: mobile.min_height,
            max_height: mobile.max_height,
            max_shadow_opacity: None,
            show_cover: true,
            mobile_scroll_support: false,
            use_portrait: true,
            start_page,
            flipping_time: Some(mobile.flipping_time_ms),
        }
    }

    /// The layout this configuration describes.
    pub fn mode(&self) -> ViewerMode {
        if self.use_portrait {
            ViewerMode::Mobile
        } else {
            ViewerMode::Desktop
        }
    }
}

/// A live page-flip instance bound to a container.
pub trait PageFlipEngine {
    /// Release the instance. Must be safe to call more than once.
    fn destroy(&mut self);

    /// Replace the instance's pages.
    fn load_pages(&mut self, pages: &[PageDescriptor]);

    /// Subscribe to page changes.
    fn on_flip(&mut self, handler: FlipHandler);

    fn flip_next(&mut self);

    fn flip_prev(&mut self);

    /// Turn to the 0-based `page_index`.
    fn flip_to(&mut self, page_index: u32);

    /// 0-based index of the page showing (the left page of a spread).
    fn current_page_index(&self) -> u32;

    fn page_count(&self) -> u32;
}

/// Constructs engine instances.
pub trait EngineFactory {
    type Engine: PageFlipEngine;

    fn construct(&mut self, container: &str, config: &RenderConfig) -> Result<Self::Engine, EngineError>;
}
