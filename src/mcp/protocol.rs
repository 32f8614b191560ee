//! JSON-RPC Protocol Types
//!
//! The subset of JSON-RPC 2.0 and MCP message types the tool filter reads or writes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version carried in every message
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP methods the filter acts on
pub mod methods {
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// JSON-RPC 2.0 Response
///
/// `id` is always serialized, as `null` when unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<JsonRpcId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<JsonRpcId>, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: Some(result), error: None }
    }

    pub fn error(id: Option<JsonRpcId>, error: JsonRpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_string(), id, result: None, error: Some(error) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum JsonRpcId {
    Number(i64),
    String(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC error codes
pub mod error_codes {
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// `tools/call` parameters
///
/// `name` is optional here so a missing name can be reported as a bad request
/// instead of failing the decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_variants() {
        assert_eq!(
            serde_json::from_value::<JsonRpcId>(json!("abc")).unwrap(),
            JsonRpcId::String("abc".to_string())
        );
        assert_eq!(serde_json::from_value::<JsonRpcId>(json!(7)).unwrap(), JsonRpcId::Number(7));
    }

    #[test]
    fn test_error_response_serializes_null_id() {
        let response = JsonRpcResponse::error(
            None,
            JsonRpcError {
                code: error_codes::INVALID_REQUEST,
                message: "bad".to_string(),
                data: None,
            },
        );

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32600, "message": "bad"}})
        );
    }

    #[test]
    fn test_tool_call_params_without_name() {
        let params: ToolCallParams =
            serde_json::from_value(json!({"arguments": {"a": 1}})).unwrap();
        assert!(params.name.is_none());
    }
}
