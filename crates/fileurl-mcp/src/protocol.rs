//! Model Context Protocol (MCP) message types and protocol implementation
//!
//! This module defines the MCP protocol messages, request/response types,
//! and error handling for communication with an MCP client over stdio.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// MCP protocol version supported by this server
pub const MCP_VERSION: &str = "2024-11-05";

/// Methods this server understands, used to tell an unknown method from a
/// malformed call to a known one
pub const KNOWN_METHODS: [&str; 9] = [
    "initialize",
    "notifications/initialized",
    "ping",
    "tools/list",
    "tools/call",
    "resources/list",
    "resources/read",
    "prompts/list",
    "prompts/get",
];

/// MCP request message (from client to server)
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MCPRequest {
    /// Initialize the MCP connection
    #[serde(rename = "initialize")]
    Initialize {
        jsonrpc: String,
        id: RequestId,
        params: InitializeParams,
    },

    /// Client finished initialization (notification, no response)
    #[serde(rename = "notifications/initialized")]
    Initialized {
        jsonrpc: String,
    },

    /// Liveness check
    #[serde(rename = "ping")]
    Ping {
        jsonrpc: String,
        id: RequestId,
    },

    /// List available tools
    #[serde(rename = "tools/list")]
    ListTools {
        jsonrpc: String,
        id: RequestId,
    },

    /// Call a specific tool
    #[serde(rename = "tools/call")]
    CallTool {
        jsonrpc: String,
        id: RequestId,
        params: CallToolParams,
    },

    /// List stored notes as resources
    #[serde(rename = "resources/list")]
    ListResources {
        jsonrpc: String,
        id: RequestId,
    },

    /// Read one note resource
    #[serde(rename = "resources/read")]
    ReadResource {
        jsonrpc: String,
        id: RequestId,
        params: ReadResourceParams,
    },

    /// List available prompts
    #[serde(rename = "prompts/list")]
    ListPrompts {
        jsonrpc: String,
        id: RequestId,
    },

    /// Render a prompt
    #[serde(rename = "prompts/get")]
    GetPrompt {
        jsonrpc: String,
        id: RequestId,
        params: GetPromptParams,
    },
}

/// Request ID (can be string or number; null only when the request could
/// not be read)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// MCP response message (from server to client)
#[derive(Debug, Serialize, Deserialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: RequestId, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Serialize `result` into a success response
    pub fn from_serializable<T: Serialize>(id: RequestId, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(
                id,
                MCPError::internal_error(format!("Failed to serialize result: {}", e)),
            ),
        }
    }
}

/// Server-initiated notification
#[derive(Debug, Serialize, Deserialize)]
pub struct MCPNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl MCPNotification {
    /// Tell the client the resource list changed
    pub fn resources_list_changed() -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: "notifications/resources/list_changed".to_string(),
            params: None,
        }
    }
}

/// Anything the server writes to the client
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    Response(MCPResponse),
    Notification(MCPNotification),
}

/// MCP error response
#[derive(Debug, Serialize, Deserialize)]
pub struct MCPError {
    pub code: MCPErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MCPError {
    fn new(code: MCPErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(MCPErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(MCPErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            MCPErrorCode::MethodNotFound,
            format!("Method '{}' not found", method),
        )
    }

    pub fn tool_not_found(tool_name: &str) -> Self {
        Self::new(
            MCPErrorCode::MethodNotFound,
            format!("Unknown tool: {}", tool_name),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(MCPErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(MCPErrorCode::InternalError, message)
    }
}

/// MCP error codes (JSON-RPC 2.0 standard), serialized as integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MCPErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl MCPErrorCode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(MCPErrorCode::ParseError),
            -32600 => Some(MCPErrorCode::InvalidRequest),
            -32601 => Some(MCPErrorCode::MethodNotFound),
            -32602 => Some(MCPErrorCode::InvalidParams),
            -32603 => Some(MCPErrorCode::InternalError),
            _ => None,
        }
    }
}

impl Serialize for MCPErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*self as i32)
    }
}

impl<'de> Deserialize<'de> for MCPErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i32::deserialize(deserializer)?;
        MCPErrorCode::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code {}", code)))
    }
}

/// Initialize request parameters
#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(rename = "clientInfo", default)]
    pub client_info: Option<ClientInfo>,
}

/// Client information
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Call tool request parameters
#[derive(Debug, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Read resource request parameters
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadResourceParams {
    pub uri: String,
}

/// Get prompt request parameters
#[derive(Debug, Serialize, Deserialize)]
pub struct GetPromptParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<HashMap<String, String>>,
}

/// Tool execution result
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "isError")]
    pub is_error: Option<bool>,
}

impl ToolResult {
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: Some(true),
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self {
            content: vec![Content::json(value)],
            is_error: None,
        }
    }
}

/// Content block in tool results and prompt messages
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn json(value: Value) -> Self {
        Content::Text {
            text: serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string()),
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Content::Text { text } => text,
        }
    }
}

/// Tool definition for tools/list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Resource entry for resources/list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub uri: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Resource body for resources/read response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceContents {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub text: String,
}

/// Prompt entry for prompts/list response
#[derive(Debug, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// Rendered prompt for prompts/get response
#[derive(Debug, Serialize, Deserialize)]
pub struct GetPromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: Content,
}

/// Initialize response
#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeResponse {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChanged>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChanged>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListChanged {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceCapabilities {
    pub subscribe: bool,
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server information
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}
