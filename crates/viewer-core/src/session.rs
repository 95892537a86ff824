//! Per-viewer session state.

use crate::mode::ViewerMode;
use serde::Serialize;

/// The single mutable state of a running viewer.
///
/// Each field has one writer: the mode detector sets `mode`, the zoom
/// controller sets the scale, navigation sync sets the page index, and the
/// asset probe sets the aspect ratio. Setters are crate-private so the shell
/// can only read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSession {
    mode: Option<ViewerMode>,
    scale_percent: u16,
    current_page_index: u32,
    total_pages: u32,
    first_asset_ratio: f64,
}

impl ViewerSession {
    pub fn new(total_pages: u32, default_aspect_ratio: f64) -> Self {
        Self {
            mode: None,
            scale_percent: 100,
            current_page_index: 0,
            total_pages,
            first_asset_ratio: default_aspect_ratio,
        }
    }

    /// `None` until the first mode evaluation.
    pub fn mode(&self) -> Option<ViewerMode> {
        self.mode
    }

    pub fn is_initialized(&self) -> bool {
        self.mode.is_some()
    }

    pub(crate) fn set_mode(&mut self, mode: ViewerMode) {
        self.mode = Some(mode);
    }

    pub fn scale(&self) -> f64 {
        f64::from(self.scale_percent) / 100.0
    }

    pub fn scale_percent(&self) -> u16 {
        self.scale_percent
    }

    pub(crate) fn set_scale_percent(&mut self, percent: u16) {
        self.scale_percent = percent;
    }

    pub fn current_page_index(&self) -> u32 {
        self.current_page_index
    }

    /// 1-based page number for display.
    pub fn current_page_number(&self) -> u32 {
        self.current_page_index + 1
    }

    /// Stores `index`, clamped to the document.
    pub(crate) fn set_current_page_index(&mut self, index: u32) {
        self.current_page_index = index.min(self.total_pages.saturating_sub(1));
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn first_asset_ratio(&self) -> f64 {
        self.first_asset_ratio
    }

    /// Ignores ratios that are not positive and finite.
    pub(crate) fn set_first_asset_ratio(&mut self, ratio: f64) -> bool {
        if ratio.is_finite() && ratio > 0.0 {
            self.first_asset_ratio = ratio;
            true
        } else {
            false
        }
    }
}
