//! Page descriptors and asset addressing.

use crate::config::DocumentConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a page's content, as understood by the engine and the
/// asset loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the engine should animate a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Rigid first or last page
    Cover,
    /// Flexible inner page
    Soft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// 1-based page number
    pub index: u32,
    pub kind: PageKind,
    pub content: ContentRef,
}

impl PageDescriptor {
    pub fn is_cover(&self) -> bool {
        self.kind == PageKind::Cover
    }
}

/// Deterministic `<dir>/<prefix><n>.<ext>` addressing of page assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    dir: String,
    prefix: String,
    extension: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::from_config(&DocumentConfig::default())
    }
}

impl AssetPaths {
    pub fn new(dir: impl Into<String>, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into(), extension: extension.into() }
    }

    pub fn from_config(document: &DocumentConfig) -> Self {
        Self::new(&document.asset_dir, &document.asset_prefix, &document.asset_extension)
    }

    /// Asset for the 1-based `page_number`.
    pub fn page(&self, page_number: u32) -> ContentRef {
        let file = format!("{}{page_number}.{}", self.prefix, self.extension);
        let dir = self.dir.trim_end_matches('/');

        if dir.is_empty() {
            ContentRef(file)
        } else {
            ContentRef(format!("{dir}/{file}"))
        }
    }
}

/// Builds the full, ordered page sequence for a document.
///
/// The sequence is always rebuilt from scratch; the engine mutates its page
/// container in ways that make patching a previous sequence unreliable.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    total_pages: u32,
    paths: AssetPaths,
}

impl PageBuilder {
    pub fn new(total_pages: u32, paths: AssetPaths) -> Self {
        Self { total_pages, paths }
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// First and last pages are covers; everything between is soft.
    pub fn build(&self) -> Vec<PageDescriptor> {
        (1..=self.total_pages)
            .map(|index| PageDescriptor {
                index,
                kind: if index == 1 || index == self.total_pages {
                    PageKind::Cover
                } else {
                    PageKind::Soft
                },
                content: self.paths.page(index),
            })
            .collect()
    }
}
