//! Error types for the viewer core.

use std::io;

/// Errors raised by a rendering engine collaborator.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("container `{container}` is still bound to a live instance")]
    ContainerBusy { container: String },
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),
    #[error("engine construction failed: {0}")]
    Construction(String),
}

/// Errors reported by an asset load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset could not be decoded: {0}")]
    Decode(String),
    #[error("asset has zero-sized dimensions: {0}")]
    EmptyImage(String),
}

/// Errors surfaced by the viewer controller to the UI shell.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to initialize viewer in {mode} mode")]
    Initialization {
        mode: crate::ViewerMode,
        #[source]
        source: EngineError,
    },
    #[error("page {page} is out of range (1..={total})")]
    PageOutOfRange { page: u32, total: u32 },
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for configuration key `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { key: key.to_owned(), reason: reason.into() }
    }
}

pub type ViewerResult<T> = Result<T, ViewerError>;
