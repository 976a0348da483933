//! MCP tool implementations
//!
//! Provides 3 tools:
//! - analyze-path: Summarize a local file, or every file under a directory
//! - analyze-url: Fetch a public URL and summarize its body
//! - add-note: Store a named note, exposed afterwards as a resource

use crate::error::ToolError;
use crate::notes::NoteStore;
use crate::protocol::{Content, ToolDefinition, ToolResult};
use async_trait::async_trait;
use fileurl_core::{analyze_path, Fetcher, HttpSource, ReqwestSource};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool name constants
pub const ANALYZE_PATH: &str = "analyze-path";
pub const ANALYZE_URL: &str = "analyze-url";
pub const ADD_NOTE: &str = "add-note";

pub type ToolOutcome = std::result::Result<ToolResult, ToolError>;

/// Tool trait for MCP tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (e.g., "analyze-path")
    fn name(&self) -> &str;

    /// Tool description
    fn description(&self) -> &str;

    /// JSON schema for tool parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool with given arguments
    async fn execute(&self, args: Option<Value>) -> ToolOutcome;

    /// Get tool definition for tools/list response
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Concrete tool enum (avoids dyn trait issues with async)
pub enum ToolEnum<S: HttpSource = ReqwestSource> {
    AnalyzePath(AnalyzePathTool),
    AnalyzeUrl(AnalyzeUrlTool<S>),
    AddNote(AddNoteTool),
}

impl<S: HttpSource> ToolEnum<S> {
    pub fn name(&self) -> &str {
        match self {
            ToolEnum::AnalyzePath(t) => t.name(),
            ToolEnum::AnalyzeUrl(t) => t.name(),
            ToolEnum::AddNote(t) => t.name(),
        }
    }

    pub async fn execute(&self, args: Option<Value>) -> ToolOutcome {
        match self {
            ToolEnum::AnalyzePath(t) => t.execute(args).await,
            ToolEnum::AnalyzeUrl(t) => t.execute(args).await,
            ToolEnum::AddNote(t) => t.execute(args).await,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        match self {
            ToolEnum::AnalyzePath(t) => t.definition(),
            ToolEnum::AnalyzeUrl(t) => t.definition(),
            ToolEnum::AddNote(t) => t.definition(),
        }
    }
}

/// Deserialize tool arguments; absent arguments read as an empty object
fn parse_args<T: DeserializeOwned>(tool: &str, args: Option<Value>) -> Result<T, ToolError> {
    let args = match args {
        Some(Value::Null) | None => json!({}),
        Some(v) => v,
    };
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidParams(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Non-empty string argument, or an InvalidParams error naming it
fn required(name: &str, value: Option<String>) -> Result<String, ToolError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ToolError::missing_argument(name)),
    }
}

// ============================================================================
// Tool 1: analyze-path
// ============================================================================

pub struct AnalyzePathTool {
    pub max_file_size: u64,
}

#[derive(Debug, Deserialize)]
struct AnalyzePathInput {
    path: Option<String>,
}

#[async_trait]
impl Tool for AnalyzePathTool {
    fn name(&self) -> &str {
        ANALYZE_PATH
    }

    fn description(&self) -> &str {
        "Analyze a local file or directory (text or binary)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to a file or directory"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Option<Value>) -> ToolOutcome {
        let input: AnalyzePathInput = parse_args(ANALYZE_PATH, args)?;
        let path = required("path", input.path)?;

        tracing::info!("Analyzing path: {}", path);
        let analysis = analyze_path(&path, self.max_file_size).await;

        Ok(ToolResult::from_value(serde_json::to_value(&analysis)?))
    }
}

// ============================================================================
// Tool 2: analyze-url
// ============================================================================

pub struct AnalyzeUrlTool<S: HttpSource = ReqwestSource> {
    pub fetcher: Arc<Fetcher<S>>,
    pub max_url_size: u64,
}

#[derive(Debug, Deserialize)]
struct AnalyzeUrlInput {
    url: Option<String>,
}

#[async_trait]
impl<S: HttpSource> Tool for AnalyzeUrlTool<S> {
    fn name(&self) -> &str {
        ANALYZE_URL
    }

    fn description(&self) -> &str {
        "Download and analyze the content of a URL (text or binary)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "http or https URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Option<Value>) -> ToolOutcome {
        let input: AnalyzeUrlInput = parse_args(ANALYZE_URL, args)?;
        let url = required("url", input.url)?;

        tracing::info!("Analyzing URL: {}", url);
        let analysis = self.fetcher.fetch_and_classify(&url, self.max_url_size).await;

        Ok(ToolResult::from_value(serde_json::to_value(&analysis)?))
    }
}

// ============================================================================
// Tool 3: add-note
// ============================================================================

pub struct AddNoteTool {
    pub notes: Arc<NoteStore>,
}

#[derive(Debug, Deserialize)]
struct AddNoteInput {
    name: Option<String>,
    content: Option<String>,
}

#[async_trait]
impl Tool for AddNoteTool {
    fn name(&self) -> &str {
        ADD_NOTE
    }

    fn description(&self) -> &str {
        "Add a new note"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "content": {"type": "string"}
            },
            "required": ["name", "content"]
        })
    }

    async fn execute(&self, args: Option<Value>) -> ToolOutcome {
        let input: AddNoteInput = parse_args(ADD_NOTE, args)?;
        let name = required("name", input.name)?;
        let content = required("content", input.content)?;

        self.notes.add(name.clone(), content.clone());
        tracing::debug!("Stored note '{}'", name);

        Ok(ToolResult::success(vec![Content::text(format!(
            "Added note '{}' with content: {}",
            name, content
        ))]))
    }
}
