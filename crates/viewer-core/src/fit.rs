//! Aspect-ratio preserving fit for the mobile layout.
//!
//! The mobile engine instance runs with fixed sizing, so its exact page size
//! is computed up front: the largest box with the page's aspect ratio that fits
//! inside the viewport minus the space reserved for controls.

use serde::{Deserialize, Serialize};

/// Smallest edge the available box is allowed to shrink to.
const MIN_AVAILABLE_PX: f64 = 1.0;

/// Viewport size at the moment of a resize or startup, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportMetrics {
    pub width: f64,
    pub height: f64,
}

impl ViewportMetrics {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Space reserved around the mobile page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMargins {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for FitMargins {
    fn default() -> Self {
        Self { horizontal: 20.0, vertical: 120.0 }
    }
}

/// Which edge of the available box limited the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingEdge {
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedSize {
    pub width: f64,
    pub height: f64,
    pub binding: BindingEdge,
}

impl FittedSize {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether two fits differ by less than `tolerance` pixels on both edges.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.width - other.width).abs() < tolerance && (self.height - other.height).abs() < tolerance
    }
}

/// Largest `aspect_ratio` box inside `available_width` × `available_height`.
///
/// If the box is relatively narrower than the page, width binds; otherwise
/// height binds. The derived edge is clamped so floating-point error can never
/// push it past the available space.
pub fn fit_to_box(available_width: f64, available_height: f64, aspect_ratio: f64) -> FittedSize {
    let available_width = available_width.max(MIN_AVAILABLE_PX);
    let available_height = available_height.max(MIN_AVAILABLE_PX);

    if available_width / available_height < aspect_ratio {
        FittedSize {
            width: available_width,
            height: (available_width / aspect_ratio).min(available_height),
            binding: BindingEdge::Width,
        }
    } else {
        FittedSize {
            width: (available_height * aspect_ratio).min(available_width),
            height: available_height,
            binding: BindingEdge::Height,
        }
    }
}

/// Fit a page into the viewport after subtracting `margins`.
pub fn fit_mobile_page(viewport: ViewportMetrics, margins: FitMargins, aspect_ratio: f64) -> FittedSize {
    fit_to_box(viewport.width - margins.horizontal, viewport.height - margins.vertical, aspect_ratio)
}
