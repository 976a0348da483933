//! Result types returned by path and URL analysis

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of content classified as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSummary {
    /// Declared or guessed MIME type
    pub content_type: String,
    /// Number of lines in the decoded text
    pub line_count: usize,
    /// Number of whitespace-separated words
    pub word_count: usize,
    /// Size of the full content in bytes
    pub byte_size: u64,
    /// First characters of the decoded text
    pub preview: String,
}

/// Summary of content classified as binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinarySummary {
    /// Declared or guessed MIME type
    pub content_type: String,
    /// Size of the full content in bytes
    pub byte_size: u64,
    /// Lowercase hex of the leading bytes
    pub preview_bytes: String,
}

/// Outcome of analyzing one file or one URL
///
/// Data-dependent failures (policy rejection, size limits, I/O and
/// transport errors) are values of this type rather than Rust errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisResult {
    Text(TextSummary),
    Binary(BinarySummary),
    Error {
        #[serde(rename = "error")]
        message: String,
    },
}

impl AnalysisResult {
    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        AnalysisResult::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResult::Error { .. })
    }

    /// Error message, if this is an error result
    pub fn error_message(&self) -> Option<&str> {
        match self {
            AnalysisResult::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Full content size, if the content was read
    pub fn byte_size(&self) -> Option<u64> {
        match self {
            AnalysisResult::Text(t) => Some(t.byte_size),
            AnalysisResult::Binary(b) => Some(b.byte_size),
            AnalysisResult::Error { .. } => None,
        }
    }

    /// Classification label: "text", "binary" or "error"
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisResult::Text(_) => "text",
            AnalysisResult::Binary(_) => "binary",
            AnalysisResult::Error { .. } => "error",
        }
    }
}

/// Per-file results of a directory walk, keyed by absolute path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryResult {
    pub files: BTreeMap<String, AnalysisResult>,
}

impl DirectoryResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for one file, returning any result it replaced
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        result: AnalysisResult,
    ) -> Option<AnalysisResult> {
        self.files.insert(path.into(), result)
    }

    pub fn get(&self, path: &str) -> Option<&AnalysisResult> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnalysisResult)> {
        self.files.iter()
    }
}

/// Result of `analyze_path`: a single file or a whole directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathAnalysis {
    File(AnalysisResult),
    Directory(DirectoryResult),
}

impl PathAnalysis {
    pub fn as_file(&self) -> Option<&AnalysisResult> {
        match self {
            PathAnalysis::File(result) => Some(result),
            PathAnalysis::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryResult> {
        match self {
            PathAnalysis::Directory(dir) => Some(dir),
            PathAnalysis::File(_) => None,
        }
    }

    /// Error message when the path itself could not be analyzed
    pub fn error_message(&self) -> Option<&str> {
        self.as_file().and_then(AnalysisResult::error_message)
    }
}

impl From<AnalysisResult> for PathAnalysis {
    fn from(result: AnalysisResult) -> Self {
        PathAnalysis::File(result)
    }
}

impl From<DirectoryResult> for PathAnalysis {
    fn from(dir: DirectoryResult) -> Self {
        PathAnalysis::Directory(dir)
    }
}
