//! Per-request filtering context.

use crate::domain::{AccountId, AllowedModules, AllowedToolsets, RequestedModules};

/// Header carrying the comma-separated module tokens a client wants
pub const MODULES_HEADER: &str = "x-harness-modules";

/// Attached to the request extensions once the enricher has resolved a request.
///
/// Its absence means filtering was never engaged for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFilterContext {
    pub account_id: AccountId,
    pub requested: RequestedModules,
    pub allowed_modules: AllowedModules,
    pub allowed_toolsets: AllowedToolsets,
}
