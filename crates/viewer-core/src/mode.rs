//! Viewport classification.
//!
//! The viewer has exactly two layouts. Widths at or below the breakpoint get
//! the single-page mobile layout; anything wider gets the two-page spread.
//! [`ModeDetector::evaluate`] is the only place a session's mode changes.

use crate::fit::ViewportMetrics;
use crate::session::ViewerSession;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default breakpoint between the two layouts, in CSS pixels.
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerMode {
    /// Two-page spread, stretch sizing
    Desktop,
    /// Single page, fixed sizing fitted to the viewport
    Mobile,
}

impl ViewerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for ViewerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a viewport width.
pub fn detect_mode(viewport_width: f64, breakpoint: f64) -> ViewerMode {
    if viewport_width <= breakpoint {
        ViewerMode::Mobile
    } else {
        ViewerMode::Desktop
    }
}

/// What the controller should do after a mode evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeDecision {
    /// Tear down the live instance and build one for this mode.
    Rebuild(ViewerMode),
    /// Still mobile: recompute the fitted page size.
    Refit,
    /// Still desktop: stretch sizing absorbs the change.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeDetector {
    breakpoint: f64,
}

impl Default for ModeDetector {
    fn default() -> Self {
        Self::new(MOBILE_BREAKPOINT_PX)
    }
}

impl ModeDetector {
    pub fn new(breakpoint: f64) -> Self {
        Self { breakpoint }
    }

    pub fn detect(&self, viewport_width: f64) -> ViewerMode {
        detect_mode(viewport_width, self.breakpoint)
    }

    /// Evaluate `viewport` against the session and record any mode change.
    ///
    /// A rebuild is requested when forced, when the mode changed, or when no
    /// instance is alive (a previous construction failed).
    pub fn evaluate(
        &self,
        session: &mut ViewerSession,
        viewport: ViewportMetrics,
        forced: bool,
        has_live_instance: bool,
    ) -> ModeDecision {
        let target = self.detect(viewport.width);
        debug!(
            "mode evaluation: width={} target={target} current={:?} forced={forced}",
            viewport.width,
            session.mode()
        );

        if forced || session.mode() != Some(target) || !has_live_instance {
            if session.mode() != Some(target) {
                info!("switching to {target} mode");
            }
            session.set_mode(target);
            return ModeDecision::Rebuild(target);
        }

        match target {
            ViewerMode::Mobile => ModeDecision::Refit,
            ViewerMode::Desktop => ModeDecision::Unchanged,
        }
    }
}
