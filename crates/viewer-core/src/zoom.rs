//! Zoom of the viewer's visual container.
//!
//! Scale is kept in whole percent so repeated steps land exactly on the
//! bounds; 25 steps of 0.1 from 1.0 end at 3.0, not 3.0000000000000004.

use crate::config::ZoomConfig;
use crate::session::ViewerSession;
use serde::{Deserialize, Serialize};

/// What the shell should apply to the container after a zoom command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomState {
    /// CSS transform, e.g. `scale(1.1)`
    pub transform: String,
    /// Percentage label, e.g. `110%`
    pub label: String,
}

impl ZoomState {
    pub fn from_percent(percent: u16) -> Self {
        let scale = f64::from(percent) / 100.0;
        Self { transform: format!("scale({scale})"), label: format!("{percent}%") }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomController {
    min_percent: u16,
    max_percent: u16,
    step_percent: u16,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(&ZoomConfig::default())
    }
}

impl ZoomController {
    pub fn new(config: &ZoomConfig) -> Self {
        Self {
            min_percent: config.min_percent,
            max_percent: config.max_percent,
            step_percent: config.step_percent,
        }
    }

    /// One step up, unless that would pass the maximum.
    pub fn zoom_in(&self, session: &mut ViewerSession) -> ZoomState {
        let current = session.scale_percent();
        let next = current.saturating_add(self.step_percent);
        if next <= self.max_percent {
            session.set_scale_percent(next);
        }

        ZoomState::from_percent(session.scale_percent())
    }

    /// One step down, unless that would pass the minimum.
    pub fn zoom_out(&self, session: &mut ViewerSession) -> ZoomState {
        let current = session.scale_percent();
        if let Some(next) = current.checked_sub(self.step_percent) {
            if next >= self.min_percent {
                session.set_scale_percent(next);
            }
        }

        ZoomState::from_percent(session.scale_percent())
    }
}
