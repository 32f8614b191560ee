//! Request classification
//!
//! The buffered request body is decoded once into a JSON value and classified as a
//! [`ToolsRequest`]; the middleware branches on the variant and forwards the same
//! bytes it decoded. A body that is not JSON, or not a JSON-RPC request, is
//! [`ToolsRequest::Other`].
//!
//! Decoding goes through [`serde_json::Value`] rather than a strict struct so that a
//! duplicated key or an unusual `id` cannot make a tool call look unclassifiable.

use serde_json::Value;

use crate::mcp::protocol::{methods, JsonRpcId, ToolCallParams};

/// A `tools/call` as seen by the authorizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: Option<JsonRpcId>,
    /// `params.name`, if present and a string
    pub name: Option<String>,
}

/// What kind of request the filter is looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolsRequest {
    List { id: Option<JsonRpcId> },
    Call(ToolCall),
    /// A JSON-RPC batch containing at least one tool method
    Batch,
    Other,
}

impl ToolsRequest {
    /// Classify a raw request body. Never fails.
    pub fn classify(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Array(messages)) => {
                if messages.iter().any(|message| tool_method(message).is_some()) {
                    ToolsRequest::Batch
                } else {
                    ToolsRequest::Other
                }
            }
            Ok(message @ Value::Object(_)) => Self::from_message(message),
            Ok(_) | Err(_) => ToolsRequest::Other,
        }
    }

    fn from_message(mut message: Value) -> Self {
        let id = message.get("id").cloned().and_then(|id| serde_json::from_value(id).ok());

        match tool_method(&message) {
            Some(methods::TOOLS_LIST) => ToolsRequest::List { id },
            Some(_) => {
                let params = message.get_mut("params").map(Value::take).unwrap_or_default();
                let name = serde_json::from_value::<ToolCallParams>(params)
                    .ok()
                    .and_then(|params| params.name);
                ToolsRequest::Call(ToolCall { id, name })
            }
            None => ToolsRequest::Other,
        }
    }

    /// Short label for logs and spans
    pub fn kind(&self) -> &'static str {
        match self {
            ToolsRequest::List { .. } => methods::TOOLS_LIST,
            ToolsRequest::Call(_) => methods::TOOLS_CALL,
            ToolsRequest::Batch => "batch",
            ToolsRequest::Other => "other",
        }
    }

    /// Whether the filter has anything to enforce for this request
    pub fn needs_filtering(&self) -> bool {
        !matches!(self, ToolsRequest::Other)
    }
}

/// `tools/list` or `tools/call` if that is the message's method
fn tool_method(message: &Value) -> Option<&'static str> {
    match message.get("method").and_then(Value::as_str) {
        Some(methods::TOOLS_LIST) => Some(methods::TOOLS_LIST),
        Some(methods::TOOLS_CALL) => Some(methods::TOOLS_CALL),
        _ => None,
    }
}
