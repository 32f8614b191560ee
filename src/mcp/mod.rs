//! MCP (Model Context Protocol) message types and request-path errors.

pub mod error;
pub mod protocol;

pub use error::ToolAccessError;
pub use protocol::{
    error_codes, methods, JsonRpcError, JsonRpcId, JsonRpcResponse,
    ToolCallParams, JSONRPC_VERSION,
};
