//! Analyzer limits
//!
//! Size ceilings and fetch bounds, read once at startup.

use std::time::Duration;

/// Default ceiling for both local files and downloads (5 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

/// Environment variable overriding the local file ceiling, in bytes
pub const MAX_FILE_SIZE_ENV: &str = "MAX_FILE_SIZE";

/// Default timeout for a whole fetch, redirects included
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum number of redirects followed per fetch
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Largest local file that will be read
    pub max_file_size: u64,
    /// Largest response body that will be downloaded
    pub max_url_size: u64,
    /// Deadline for a single fetch
    pub fetch_timeout: Duration,
    /// Redirect hops followed before giving up
    pub max_redirects: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_SIZE,
            max_url_size: DEFAULT_MAX_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl AnalyzerConfig {
    /// Create config from environment variables
    ///
    /// Only the local file ceiling is configurable; the download ceiling is
    /// fixed. An unset or unparsable value falls back to the default.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MAX_FILE_SIZE_ENV).ok().as_deref())
    }

    fn from_env_value(max_file_size: Option<&str>) -> Self {
        let max_file_size = max_file_size
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_SIZE);

        Self {
            max_file_size,
            ..Self::default()
        }
    }

    /// Override the local file ceiling
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}
