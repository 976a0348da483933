//! fileurl MCP Server - Model Context Protocol access to file and URL analysis
//!
//! Exposes the `fileurl-core` analyzers to an MCP client over stdio.
//!
//! # Features
//!
//! - **3 Tools**: analyze-path, analyze-url, add-note
//! - **Note Resources**: every note is readable as `note://internal/<name>`
//! - **Prompts**: summarize-notes renders the stored notes for the model
//! - **Guarded Fetching**: URLs are validated before and during the fetch
//!
//! # Usage
//!
//! ```bash
//! fileurl-mcp --log-level debug
//! ```
//!
//! The size ceiling defaults to 5 MiB and is read from `MAX_FILE_SIZE`, or
//! overridden with `--max-file-size`.

mod error;
mod notes;
mod prompts;
mod protocol;
mod server;
mod tools;

pub use error::ToolError;
pub use notes::{note_uri, NoteStore, NOTE_URI_PREFIX};
pub use protocol::{
    CallToolParams, Content, InitializeParams, MCPError, MCPErrorCode, MCPNotification,
    MCPRequest, MCPResponse, Outgoing, RequestId, ToolResult,
};
pub use server::{MCPServer, ServerConfig, SERVER_NAME};
pub use tools::{AddNoteTool, AnalyzePathTool, AnalyzeUrlTool, Tool, ToolEnum};

pub use anyhow::Result;
