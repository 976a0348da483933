//! # fileurl Core
//!
//! Inspection primitives shared by the MCP server and the CLI.
//!
//! This crate turns a local path or a remote URL into a compact structural
//! summary instead of returning the full content:
//! - **Guard**: decides whether a URL may be fetched at all (SSRF protection)
//! - **Fetch**: bounded, timed HTTP retrieval behind the guard
//! - **Path**: file and recursive directory analysis
//! - **Classify**: the text/binary policy both of them share
//!
//! ## Example
//!
//! ```rust,no_run
//! use fileurl_core::{analyze_path, is_safe, AnalyzerConfig};
//!
//! # async fn run() {
//! let config = AnalyzerConfig::from_env();
//! assert!(!is_safe("http://127.0.0.1/admin"));
//!
//! let report = analyze_path("Cargo.toml", config.max_file_size).await;
//! println!("{}", serde_json::to_string_pretty(&report).unwrap());
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod path;
pub mod types;

// Re-export commonly used items
pub use classify::{count_lines, summarize, HEX_PREVIEW_BYTES, TEXT_PREVIEW_CHARS};
pub use config::{AnalyzerConfig, DEFAULT_MAX_SIZE, MAX_FILE_SIZE_ENV};
pub use error::{Error, Result};
pub use fetch::{Fetcher, HttpSource, RemoteBody, ReqwestSource};
pub use guard::{is_blocked_ip, is_safe};
pub use path::{analyze_path, classify_file};
pub use types::{AnalysisResult, BinarySummary, DirectoryResult, PathAnalysis, TextSummary};
