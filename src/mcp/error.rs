//! Tool access errors
//!
//! Errors raised on the request path. Each one renders as a JSON-RPC error envelope
//! with `id: null` and a matching HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::AllowedToolsets;
use crate::mcp::protocol::{error_codes, JsonRpcError, JsonRpcResponse};

#[derive(Error, Debug)]
pub enum ToolAccessError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Tool '{tool}' is not available. Allowed toolsets: {allowed}")]
    ToolNotAllowed { tool: String, toolset: Option<String>, allowed: AllowedToolsets },

    #[error("Invalid request: batch requests containing tool methods are not supported")]
    BatchNotSupported,

    #[error("Invalid request: failed to read request body: {0}")]
    BodyUnreadable(String),

    #[error("Upstream MCP server unavailable")]
    UpstreamUnavailable,
}

impl ToolAccessError {
    /// Missing `params.name` on a `tools/call`
    pub fn missing_tool_name() -> Self {
        Self::InvalidRequest("tools/call requires params.name".to_string())
    }

    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            ToolAccessError::InvalidRequest(_)
            | ToolAccessError::BatchNotSupported
            | ToolAccessError::BodyUnreadable(_) => error_codes::INVALID_REQUEST,
            ToolAccessError::ToolNotAllowed { .. } => error_codes::METHOD_NOT_FOUND,
            ToolAccessError::UpstreamUnavailable => error_codes::INTERNAL_ERROR,
        }
    }

    /// HTTP status the error is returned with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ToolAccessError::InvalidRequest(_)
            | ToolAccessError::BatchNotSupported
            | ToolAccessError::BodyUnreadable(_) => StatusCode::BAD_REQUEST,
            ToolAccessError::ToolNotAllowed { .. } => StatusCode::FORBIDDEN,
            ToolAccessError::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        }
    }

    /// Convert to JsonRpcError
    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        let data = match self {
            ToolAccessError::ToolNotAllowed { tool, toolset, allowed } => Some(json!({
                "tool": tool,
                "toolset": toolset,
                "allowedToolsets": allowed.to_vec(),
            })),
            _ => None,
        };

        JsonRpcError { code: self.error_code(), message: self.to_string(), data }
    }
}

impl From<ToolAccessError> for JsonRpcError {
    fn from(error: ToolAccessError) -> Self {
        error.to_json_rpc_error()
    }
}

impl IntoResponse for ToolAccessError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = JsonRpcResponse::error(None, self.to_json_rpc_error());
        (status, Json(body)).into_response()
    }
}
