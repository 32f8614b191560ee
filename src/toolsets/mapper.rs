//! Toolset mapper: modules → allowed toolsets, tool → toolset.

use std::fmt;
use std::sync::Arc;

use crate::domain::{AllowedModules, AllowedToolsets, DEFAULT_TOOLSET};
use crate::toolsets::registry::ModuleToolsets;
use crate::toolsets::tracker::ToolTracker;

/// Pure lookups over the module registry and the tool tracker
#[derive(Clone)]
pub struct ToolsetMapper {
    registry: Arc<dyn ModuleToolsets>,
    tracker: Arc<dyn ToolTracker>,
}

impl ToolsetMapper {
    pub fn new(registry: Arc<dyn ModuleToolsets>, tracker: Arc<dyn ToolTracker>) -> Self {
        Self { registry, tracker }
    }

    /// Union of the toolsets of every allowed module, plus [`DEFAULT_TOOLSET`]
    pub fn toolsets_for_modules(&self, modules: &AllowedModules) -> AllowedToolsets {
        let mut allowed = AllowedToolsets::empty();
        for module in modules.iter() {
            for toolset in self.registry.toolsets_for_module(module) {
                allowed.insert(toolset.as_str());
            }
        }
        allowed.insert(DEFAULT_TOOLSET);
        allowed
    }

    /// Owning toolset of a tool, `None` if the tracker does not know it
    pub fn toolset_for_tool(&self, tool_name: &str) -> Option<&str> {
        self.tracker.toolset_for_tool(tool_name)
    }

    /// Whether a tool belongs to one of the allowed toolsets
    pub fn is_tool_allowed(&self, tool_name: &str, allowed: &AllowedToolsets) -> bool {
        self.toolset_for_tool(tool_name).is_some_and(|toolset| allowed.contains(toolset))
    }
}

impl fmt::Debug for ToolsetMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolsetMapper").finish_non_exhaustive()
    }
}
