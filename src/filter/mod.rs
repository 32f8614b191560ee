//! # Tool Filtering
//!
//! License-aware filtering of MCP tool discovery and invocation.
//!
//! ```text
//! classify → enrich → authorize (tools/call) → next handler → filter (tools/list)
//! ```

pub mod call_authorizer;
pub mod classifier;
pub mod context;
pub mod enricher;
pub mod list_filter;
pub mod middleware;

pub use call_authorizer::authorize_call;
pub use classifier::{ToolCall, ToolsRequest};
pub use context::{ToolFilterContext, MODULES_HEADER};
pub use enricher::{ContextEnricher, MissingModulesPolicy};
pub use list_filter::{
    fail_closed_body, filter_json_body, filter_list_payload, filter_sse_body,
    filter_tools_by_toolsets, ListFailureMode, ListFilterError,
};
pub use middleware::{filter_tool_requests, SharedToolFilter, ToolFilter};
