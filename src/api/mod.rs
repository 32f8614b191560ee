//! # HTTP Surface
//!
//! Router assembly, account identity extraction, and the upstream MCP proxy.

pub mod identity;
pub mod proxy;
pub mod server;

pub use identity::{attach_account, IdentitySource, SharedIdentitySource};
pub use proxy::{proxy_to_upstream, SharedUpstreamProxy, UpstreamProxy};
pub use server::{build_router, build_tool_filter, start_server, HEALTH_PATH};
