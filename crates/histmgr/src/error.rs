//! Error types for the histogram manager.

use thiserror::Error;

/// Errors raised by [`crate::HistManager`].
#[derive(Error, Debug)]
pub enum Error {
    /// No entry is registered under the name.
    #[error("no histogram named '{0}'")]
    KeyNotFound(String),

    /// Error from a histogram operation or the container layer.
    #[error(transparent)]
    Root(#[from] hm_root::RootError),

    /// I/O error outside the container layer (config files, directories).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
