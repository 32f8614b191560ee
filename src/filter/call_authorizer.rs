//! `tools/call` authorization.

use tracing::warn;

use crate::filter::classifier::ToolCall;
use crate::filter::context::ToolFilterContext;
use crate::mcp::error::ToolAccessError;
use crate::toolsets::ToolsetMapper;

/// Decide whether a tool call may reach the downstream server.
///
/// A call without `params.name` is a bad request. A tool whose toolset is unknown,
/// or not in the allowed set, is denied.
pub fn authorize_call(
    call: &ToolCall,
    context: &ToolFilterContext,
    mapper: &ToolsetMapper,
) -> Result<(), ToolAccessError> {
    let Some(tool) = call.name.as_deref() else {
        warn!(account_id = %context.account_id, "Rejected tools/call without params.name");
        return Err(ToolAccessError::missing_tool_name());
    };

    let toolset = mapper.toolset_for_tool(tool);
    if toolset.is_some_and(|toolset| context.allowed_toolsets.contains(toolset)) {
        return Ok(());
    }

    warn!(
        account_id = %context.account_id,
        tool = %tool,
        toolset = toolset.unwrap_or("<none>"),
        allowed_toolsets = %context.allowed_toolsets,
        "Denied tools/call outside allowed toolsets"
    );

    Err(ToolAccessError::ToolNotAllowed {
        tool: tool.to_string(),
        toolset: toolset.map(str::to_string),
        allowed: context.allowed_toolsets.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccountId, AllowedModules, AllowedToolsets, LicensedModules, RequestedModules,
    };
    use crate::mcp::protocol::error_codes;
    use crate::toolsets::{ModuleRegistry, ToolGroupTracker};
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn mapper() -> ToolsetMapper {
        let mut tracker = ToolGroupTracker::new();
        tracker.register("pipelines", ["list_pipelines"]).unwrap();
        tracker.register("builds", ["get_build"]).unwrap();
        ToolsetMapper::new(Arc::new(ModuleRegistry::builtin()), Arc::new(tracker))
    }

    fn context(allowed: &[&str]) -> ToolFilterContext {
        ToolFilterContext {
            account_id: AccountId::new("acct-1").unwrap(),
            requested: RequestedModules::parse("CORE"),
            allowed_modules: AllowedModules::compute(
                &RequestedModules::parse("CORE"),
                &LicensedModules::baseline(),
            ),
            allowed_toolsets: allowed.iter().copied().collect::<AllowedToolsets>(),
        }
    }

    fn call(name: Option<&str>) -> ToolCall {
        ToolCall { id: None, name: name.map(str::to_string) }
    }

    #[test]
    fn test_allowed_tool() {
        let result =
            authorize_call(&call(Some("list_pipelines")), &context(&["pipelines", "default"]), &mapper());
        assert!(result.is_ok());
    }

    #[traced_test]
    #[test]
    fn test_denied_tool() {
        let err = authorize_call(&call(Some("get_build")), &context(&["pipelines"]), &mapper())
            .unwrap_err();

        assert_eq!(err.error_code(), error_codes::METHOD_NOT_FOUND);
        assert!(err.to_string().contains("get_build"));
        assert!(err.to_string().contains("[pipelines]"));
        assert!(logs_contain("Denied tools/call outside allowed toolsets"));
    }

    #[test]
    fn test_untracked_tool_is_denied() {
        let err = authorize_call(&call(Some("mystery")), &context(&["pipelines"]), &mapper())
            .unwrap_err();
        assert!(matches!(err, ToolAccessError::ToolNotAllowed { toolset: None, .. }));
    }

    #[test]
    fn test_missing_name_is_bad_request() {
        let err = authorize_call(&call(None), &context(&["pipelines"]), &mapper()).unwrap_err();
        assert_eq!(err.error_code(), error_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_empty_allowed_set_denies_everything() {
        let err = authorize_call(&call(Some("list_pipelines")), &context(&[]), &mapper()).unwrap_err();
        assert!(matches!(err, ToolAccessError::ToolNotAllowed { .. }));
    }
}
