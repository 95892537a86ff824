//! Asset loading contract.
//!
//! The core never decodes images. It asks an [`AssetLoader`] to fetch an asset
//! and is told, through a [`LoadCompleter`], whether that worked and how large
//! the image is. Two things use this: the startup probe that learns the page
//! aspect ratio, and the off-screen preload that precedes every background swap.

use crate::events::LoadCompleter;
use crate::page::ContentRef;
use serde::{Deserialize, Serialize};

/// Natural pixel size of a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height, or `None` for a degenerate image.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            return None;
        }

        Some(f64::from(self.width) / f64::from(self.height))
    }
}

/// Starts asset loads.
///
/// Implementations may complete `done` immediately, later from the host's
/// event loop, or never. Completing it from inside `load` is fine: the event
/// is queued and handled after the current command returns.
pub trait AssetLoader {
    fn load(&mut self, asset: &ContentRef, done: LoadCompleter);
}

impl<L: AssetLoader + ?Sized> AssetLoader for Box<L> {
    fn load(&mut self, asset: &ContentRef, done: LoadCompleter) {
        (**self).load(asset, done);
    }
}

/// Why a load was started; decides which continuation runs on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPurpose {
    /// Startup probe of the first page's aspect ratio
    AspectProbe,
    /// Off-screen preload ahead of a background swap
    Background(ContentRef),
}
