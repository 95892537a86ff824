//! Display state the shell renders.

use crate::page::ContentRef;
use crate::zoom::ZoomState;
use serde::Serialize;

/// Numeric page entry shown in desktop mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInput {
    /// 1-based page number
    pub value: u32,
    /// Upper bound accepted by the input
    pub max: u32,
}

/// Everything the controller wants on screen.
///
/// Mode-specific widgets keep their last value while the other mode is
/// active; the shell only shows the ones for the current mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerDisplay {
    /// Desktop numeric input
    pub page_input: Option<PageInput>,
    /// Desktop label after the input, e.g. ` / 44`
    pub page_label: Option<String>,
    /// Mobile indicator, e.g. `3 / 44`
    pub compact_indicator: Option<String>,
    /// Desktop only: `false` while the front cover is showing
    pub book_open: bool,
    /// Background asset currently swapped in
    pub background: Option<ContentRef>,
    pub zoom: ZoomState,
}

impl Default for ViewerDisplay {
    fn default() -> Self {
        Self {
            page_input: None,
            page_label: None,
            compact_indicator: None,
            book_open: false,
            background: None,
            zoom: ZoomState::from_percent(100),
        }
    }
}
