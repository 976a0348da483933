//! Analyzer error types

use std::time::Duration;
use thiserror::Error;

/// The main error type for fetch and file analysis
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading a local file
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error (connect, TLS, body stream)
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL or resolved address rejected by the guard
    #[error("Blocked destination: {0}")]
    Blocked(String),

    /// Content exceeds the configured ceiling
    #[error("{what} too large (>{limit_mb} MB)")]
    TooLarge { what: &'static str, limit_mb: u64 },

    /// Redirect chain longer than allowed
    #[error("Too many redirects (max {0})")]
    RedirectLimit(usize),

    /// Request exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Host name did not resolve to any address
    #[error("Could not resolve host: {0}")]
    NotFound(String),
}

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, Error>;

/// One mebibyte, the unit used in size-limit messages
pub const MIB: u64 = 1024 * 1024;

impl Error {
    /// Create a too-large error; the limit is rendered in whole MiB
    pub fn too_large(what: &'static str, limit_bytes: u64) -> Self {
        Error::TooLarge {
            what,
            limit_mb: limit_bytes / MIB,
        }
    }

    /// Create a blocked-destination error
    pub fn blocked(msg: impl Into<String>) -> Self {
        Error::Blocked(msg.into())
    }

    /// Create an invalid URL error
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Error::InvalidUrl(msg.into())
    }

    /// True for the size-limit class, which is reported verbatim
    pub fn is_too_large(&self) -> bool {
        matches!(self, Error::TooLarge { .. })
    }
}
