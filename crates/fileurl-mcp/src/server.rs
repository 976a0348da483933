//! MCP Server implementation
//!
//! Reads newline-delimited JSON-RPC requests, dispatches them to tools,
//! note resources and prompts, and writes one JSON line per reply.

use crate::notes::{note_name, note_uri, NoteStore};
use crate::prompts;
use crate::protocol::*;
use crate::tools::*;
use anyhow::{Context, Result};
use fileurl_core::{AnalyzerConfig, Fetcher, HttpSource, ReqwestSource};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Name reported in the initialize handshake
pub const SERVER_NAME: &str = "mcp-file-url-analyzer";

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub analyzer: AnalyzerConfig,
}

/// MCP Server
pub struct MCPServer<S: HttpSource = ReqwestSource> {
    tools: Vec<ToolEnum<S>>,
    notes: Arc<NoteStore>,
}

impl MCPServer<ReqwestSource> {
    /// Create a server that fetches URLs over the network
    pub fn new(config: ServerConfig, notes: Arc<NoteStore>) -> Self {
        let fetcher = Fetcher::new(&config.analyzer);
        Self::with_fetcher(config, fetcher, notes)
    }
}

impl<S: HttpSource> MCPServer<S> {
    /// Create a server around an explicit fetcher
    pub fn with_fetcher(config: ServerConfig, fetcher: Fetcher<S>, notes: Arc<NoteStore>) -> Self {
        let tools: Vec<ToolEnum<S>> = vec![
            ToolEnum::AddNote(AddNoteTool {
                notes: notes.clone(),
            }),
            ToolEnum::AnalyzePath(AnalyzePathTool {
                max_file_size: config.analyzer.max_file_size,
            }),
            ToolEnum::AnalyzeUrl(AnalyzeUrlTool {
                fetcher: Arc::new(fetcher),
                max_url_size: config.analyzer.max_url_size,
            }),
        ];

        Self { tools, notes }
    }

    /// Shared note store
    pub fn notes(&self) -> &Arc<NoteStore> {
        &self.notes
    }

    /// Listen on stdio
    pub async fn listen_stdio(&self) -> Result<()> {
        tracing::info!("Starting MCP server in stdio mode");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited requests from `reader` until EOF
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .await
                .context("Failed to read request")?;

            if bytes_read == 0 {
                // EOF
                break;
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            tracing::debug!("Received request: {}", message);

            for outgoing in self.handle_message(message).await {
                let json = serde_json::to_string(&outgoing)?;
                tracing::debug!("Sending: {}", json);
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            writer.flush().await?;
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one raw JSON-RPC message, returning everything to send back
    pub async fn handle_message(&self, message: &str) -> Vec<Outgoing> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to parse request: {}", e);
                return vec![Outgoing::Response(MCPResponse::error(
                    RequestId::Null,
                    MCPError::parse_error(format!("Failed to parse request: {}", e)),
                ))];
            }
        };

        // A present but unusable id still gets a reply, addressed to null
        let id = match value.get("id") {
            None => None,
            Some(raw) => match request_id(raw) {
                Some(id) => Some(id),
                None => {
                    tracing::warn!("Rejected request with invalid id {}", raw);
                    return vec![Outgoing::Response(MCPResponse::error(
                        RequestId::Null,
                        MCPError::invalid_request("Invalid request id"),
                    ))];
                }
            },
        };
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);

        let request: MCPRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                let Some(id) = id else {
                    tracing::debug!("Ignoring notification {:?}: {}", method, e);
                    return Vec::new();
                };
                let error = match method.as_deref() {
                    Some(m) if !KNOWN_METHODS.contains(&m) => MCPError::method_not_found(m),
                    _ => MCPError::invalid_request(format!("Invalid request: {}", e)),
                };
                tracing::warn!("Rejected request {}: {}", id, error.message);
                return vec![Outgoing::Response(MCPResponse::error(id, error))];
            }
        };

        let notes_changed = matches!(
            &request,
            MCPRequest::CallTool { params, .. } if params.name == ADD_NOTE
        );

        let mut outgoing = Vec::new();
        if let Some(response) = self.handle_request(request).await {
            let succeeded = response.error.is_none();
            outgoing.push(Outgoing::Response(response));
            if notes_changed && succeeded {
                outgoing.push(Outgoing::Notification(
                    MCPNotification::resources_list_changed(),
                ));
            }
        }
        outgoing
    }

    /// Handle a parsed request; notifications produce no response
    pub async fn handle_request(&self, request: MCPRequest) -> Option<MCPResponse> {
        let response = match request {
            MCPRequest::Initialize { id, params, .. } => self.handle_initialize(id, params),
            MCPRequest::Initialized { .. } => {
                tracing::info!("Client initialized");
                return None;
            }
            MCPRequest::Ping { id, .. } => MCPResponse::success(id, json!({})),
            MCPRequest::ListTools { id, .. } => self.handle_list_tools(id),
            MCPRequest::CallTool { id, params, .. } => self.handle_call_tool(id, params).await,
            MCPRequest::ListResources { id, .. } => self.handle_list_resources(id),
            MCPRequest::ReadResource { id, params, .. } => self.handle_read_resource(id, params),
            MCPRequest::ListPrompts { id, .. } => {
                MCPResponse::success(id, json!({ "prompts": prompts::definitions() }))
            }
            MCPRequest::GetPrompt { id, params, .. } => {
                match prompts::render(&params.name, params.arguments.as_ref(), &self.notes) {
                    Ok(result) => MCPResponse::from_serializable(id, &result),
                    Err(error) => MCPResponse::error(id, error),
                }
            }
        };
        Some(response)
    }

    fn handle_initialize(&self, id: RequestId, params: InitializeParams) -> MCPResponse {
        if let Some(client) = &params.client_info {
            tracing::info!(
                "Initializing for {} {} (protocol {})",
                client.name,
                client.version,
                params.protocol_version
            );
        }

        let result = InitializeResponse {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ListChanged {
                    list_changed: false,
                }),
                resources: Some(ResourceCapabilities {
                    subscribe: false,
                    list_changed: true,
                }),
                prompts: Some(ListChanged {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        MCPResponse::from_serializable(id, &result)
    }

    fn handle_list_tools(&self, id: RequestId) -> MCPResponse {
        let tools: Vec<ToolDefinition> = self.tools.iter().map(|t| t.definition()).collect();

        MCPResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_call_tool(&self, id: RequestId, params: CallToolParams) -> MCPResponse {
        // Find tool
        let tool = match self.tools.iter().find(|t| t.name() == params.name) {
            Some(t) => t,
            None => {
                tracing::warn!("Unknown tool requested: {}", params.name);
                return MCPResponse::error(id, MCPError::tool_not_found(&params.name));
            }
        };

        // Execute tool
        match tool.execute(params.arguments).await {
            Ok(result) => MCPResponse::from_serializable(id, &result),
            Err(e) => MCPResponse::error(id, e.into()),
        }
    }

    fn handle_list_resources(&self, id: RequestId) -> MCPResponse {
        let resources: Vec<ResourceDefinition> = self
            .notes
            .list()
            .into_iter()
            .map(|(name, _)| ResourceDefinition {
                uri: note_uri(&name),
                description: format!("A simple note named {}", name),
                name: format!("Note: {}", name),
                mime_type: "text/plain".to_string(),
            })
            .collect();

        MCPResponse::success(id, json!({ "resources": resources }))
    }

    fn handle_read_resource(&self, id: RequestId, params: ReadResourceParams) -> MCPResponse {
        let Some(name) = note_name(&params.uri) else {
            return MCPResponse::error(
                id,
                MCPError::invalid_params(format!("Unsupported URI: {}", params.uri)),
            );
        };

        match self.notes.get(name) {
            Some(text) => {
                let contents = ResourceContents {
                    uri: params.uri.clone(),
                    mime_type: "text/plain".to_string(),
                    text,
                };
                MCPResponse::success(id, json!({ "contents": [contents] }))
            }
            None => MCPResponse::error(
                id,
                MCPError::invalid_params(format!("Note not found: {}", name)),
            ),
        }
    }
}

/// Ids may only be strings, integers or null
fn request_id(raw: &Value) -> Option<RequestId> {
    match raw {
        Value::String(s) => Some(RequestId::String(s.clone())),
        Value::Number(n) => n.as_i64().map(RequestId::Number),
        Value::Null => Some(RequestId::Null),
        _ => None,
    }
}
