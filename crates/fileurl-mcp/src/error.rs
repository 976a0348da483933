//! Tool execution errors

use crate::protocol::MCPError;
use thiserror::Error;

/// Failure while executing a tool call
#[derive(Error, Debug)]
pub enum ToolError {
    /// Caller supplied missing or malformed arguments
    #[error("{0}")]
    InvalidParams(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn missing_argument(name: &str) -> Self {
        ToolError::InvalidParams(format!("Missing '{}' argument", name))
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Internal(err.into())
    }
}

impl From<ToolError> for MCPError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::InvalidParams(message) => MCPError::invalid_params(message),
            ToolError::Internal(e) => {
                tracing::error!("Tool execution error: {:#}", e);
                MCPError::internal_error(format!("Tool execution failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MCPErrorCode;

    #[test]
    fn test_missing_argument_maps_to_invalid_params() {
        let err: MCPError = ToolError::missing_argument("url").into();
        assert_eq!(err.code, MCPErrorCode::InvalidParams);
        assert_eq!(err.message, "Missing 'url' argument");
    }

    #[test]
    fn test_internal_maps_to_internal_error() {
        let err: MCPError = ToolError::Internal(anyhow::anyhow!("boom")).into();
        assert_eq!(err.code, MCPErrorCode::InternalError);
        assert!(err.message.contains("boom"));
    }
}
