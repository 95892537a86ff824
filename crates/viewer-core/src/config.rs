//! Viewer configuration.
//!
//! Every tunable of the viewer lives in [`ViewerConfig`]. Defaults reproduce
//! the stock flipbook (44 pages of `ebook/page_<n>.webp`, 768px breakpoint,
//! 200ms resize debounce). Configuration can be loaded from a TOML file and
//! then overridden by environment variables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Complete viewer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Page count, asset naming and the engine container
    pub document: DocumentConfig,
    /// Mode detection and mobile fitting
    pub layout: LayoutConfig,
    /// Engine settings for the two-page spread
    pub desktop: DesktopConfig,
    /// Engine settings for the single-page layout
    pub mobile: MobileConfig,
    /// Zoom range and step, in percent
    pub zoom: ZoomConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Number of pages; fixed for the lifetime of a session
    pub total_pages: u32,
    /// Directory (or URL prefix) holding the page assets
    pub asset_dir: String,
    /// File name prefix, followed by the 1-based page number
    pub asset_prefix: String,
    /// File extension without the dot
    pub asset_extension: String,
    /// Width / height ratio used until the asset probe succeeds
    pub default_aspect_ratio: f64,
    /// Identifier of the element the engine renders into
    pub container_id: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            total_pages: 44,
            asset_dir: "ebook".to_owned(),
            asset_prefix: "page_".to_owned(),
            asset_extension: "webp".to_owned(),
            default_aspect_ratio: 0.707, // A4, roughly
            container_id: "book".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Widths at or below this are mobile
    pub mobile_breakpoint_px: f64,
    /// Quiet period before a resize burst is evaluated
    pub resize_debounce_ms: u64,
    /// Horizontal space reserved around the mobile page
    pub mobile_margin_x: f64,
    /// Vertical space reserved for the mobile controls
    pub mobile_margin_y: f64,
    /// Keep the current page when a mode switch rebuilds the engine
    pub preserve_page_on_rebuild: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: 768.0,
            resize_debounce_ms: 200,
            mobile_margin_x: 20.0,
            mobile_margin_y: 120.0,
            preserve_page_on_rebuild: false,
        }
    }
}

impl LayoutConfig {
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub max_shadow_opacity: f64,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            min_width: 400.0,
            max_width: 1600.0,
            min_height: 300.0,
            max_height: 1200.0,
            max_shadow_opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobileConfig {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    /// Flip animation length; slower than the engine default to suit touch
    pub flipping_time_ms: u32,
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            min_width: 200.0,
            max_width: 3000.0,
            min_height: 200.0,
            max_height: 3000.0,
            flipping_time_ms: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_percent: u16,
    pub max_percent: u16,
    pub step_percent: u16,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self { min_percent: 50, max_percent: 300, step_percent: 10 }
    }
}

impl ViewerConfig {
    /// Loads configuration from a TOML file and validates it.
    ///
    /// Expected file format (every key optional):
    /// ```toml
    /// [document]
    /// total_pages = 44
    /// asset_dir = "ebook"
    ///
    /// [layout]
    /// mobile_breakpoint_px = 768
    /// resize_debounce_ms = 200
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or holds invalid values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables.
    ///
    /// Environment variables:
    /// - `FLIPBOOK_TOTAL_PAGES`: page count (default: 44)
    /// - `FLIPBOOK_ASSET_DIR`: asset directory (default: `ebook`)
    /// - `FLIPBOOK_BREAKPOINT_PX`: mobile breakpoint (default: 768)
    /// - `FLIPBOOK_DEBOUNCE_MS`: resize quiet period (default: 200)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Applies `FLIPBOOK_*` environment overrides on top of this configuration.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup, then validates.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("FLIPBOOK_TOTAL_PAGES") {
            self.document.total_pages = parse_env("FLIPBOOK_TOTAL_PAGES", &value)?;
        }

        if let Some(value) = lookup("FLIPBOOK_ASSET_DIR") {
            self.document.asset_dir = value;
        }

        if let Some(value) = lookup("FLIPBOOK_BREAKPOINT_PX") {
            self.layout.mobile_breakpoint_px = parse_env("FLIPBOOK_BREAKPOINT_PX", &value)?;
        }

        if let Some(value) = lookup("FLIPBOOK_DEBOUNCE_MS") {
            self.layout.resize_debounce_ms = parse_env("FLIPBOOK_DEBOUNCE_MS", &value)?;
        }

        self.validate()
    }

    /// Checks the invariants the controller relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.document.total_pages == 0 {
            return Err(ConfigError::invalid("document.total_pages", "must be at least 1"));
        }

        let ratio = self.document.default_aspect_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::invalid(
                "document.default_aspect_ratio",
                "must be a positive number",
            ));
        }

        let layout = &self.layout;
        if !is_positive(layout.mobile_breakpoint_px) {
            return Err(ConfigError::invalid(
                "layout.mobile_breakpoint_px",
                "must be a positive number",
            ));
        }

        if !is_non_negative(layout.mobile_margin_x) || !is_non_negative(layout.mobile_margin_y) {
            return Err(ConfigError::invalid("layout.mobile_margin", "must not be negative"));
        }

        let desktop = &self.desktop;
        if !is_positive(desktop.width) || !is_positive(desktop.height) {
            return Err(ConfigError::invalid("desktop", "width and height must be positive"));
        }

        check_bounds(
            "desktop",
            [desktop.min_width, desktop.max_width, desktop.min_height, desktop.max_height],
        )?;

        if !(0.0..=1.0).contains(&desktop.max_shadow_opacity) {
            return Err(ConfigError::invalid("desktop.max_shadow_opacity", "must be within 0..=1"));
        }

        let mobile = &self.mobile;
        check_bounds(
            "mobile",
            [mobile.min_width, mobile.max_width, mobile.min_height, mobile.max_height],
        )?;

        if mobile.flipping_time_ms == 0 {
            return Err(ConfigError::invalid("mobile.flipping_time_ms", "must be at least 1"));
        }

        let zoom = &self.zoom;
        if zoom.step_percent == 0 {
            return Err(ConfigError::invalid("zoom.step_percent", "must be at least 1"));
        }

        if zoom.min_percent == 0 || zoom.min_percent > 100 || zoom.max_percent < 100 {
            return Err(ConfigError::invalid("zoom", "range must contain 100% and exclude 0%"));
        }

        Ok(())
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// `[min_width, max_width, min_height, max_height]`: finite, non-negative, ordered.
fn check_bounds(
    section: &str,
    [min_width, max_width, min_height, max_height]: [f64; 4],
) -> Result<(), ConfigError> {
    if ![min_width, max_width, min_height, max_height].into_iter().all(is_non_negative) {
        return Err(ConfigError::invalid(section, "bounds must be finite and not negative"));
    }

    if min_width > max_width || min_height > max_height {
        return Err(ConfigError::invalid(section, "minimum bounds exceed maximum bounds"));
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::invalid(key, format!("cannot parse `{value}`")))
}
