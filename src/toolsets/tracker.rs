//! Tool → toolset tracker
//!
//! Records which toolset owns each tool. A tool belongs to at most one toolset;
//! tools that were never registered have no toolset and are always denied.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::errors::{Error, Result};

/// Tool name → owning toolset lookup used by the mapper
pub trait ToolTracker: Send + Sync {
    /// Owning toolset of a tool, if it was registered
    fn toolset_for_tool(&self, tool_name: &str) -> Option<&str>;
}

/// In-memory tool → toolset tracker
#[derive(Debug, Clone, Default)]
pub struct ToolGroupTracker {
    groups: HashMap<String, String>,
}

impl ToolGroupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the tools of a toolset.
    ///
    /// Fails if a tool is already owned by a different toolset. Re-registering a
    /// tool under the same toolset is a no-op.
    pub fn register<I, S>(&mut self, toolset: &str, tools: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let toolset = toolset.trim();
        if toolset.is_empty() {
            return Err(Error::registry("tool group has an empty toolset name"));
        }

        for tool in tools {
            let tool = tool.as_ref().trim();
            if tool.is_empty() {
                return Err(Error::registry(format!("toolset '{}' lists an empty tool name", toolset)));
            }

            match self.groups.get(tool) {
                Some(owner) if owner != toolset => {
                    return Err(Error::registry(format!(
                        "tool '{}' is claimed by toolsets '{}' and '{}'",
                        tool, owner, toolset
                    )));
                }
                Some(_) => {}
                None => {
                    self.groups.insert(tool.to_string(), toolset.to_string());
                }
            }
        }

        Ok(())
    }

    /// Build a tracker from a configured toolset → tools table
    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut tracker = Self::new();
        for (toolset, tools) in table {
            tracker.register(toolset, tools)?;
        }

        debug!(tools = tracker.len(), toolsets = table.len(), "Loaded tool group table");
        Ok(tracker)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl ToolTracker for ToolGroupTracker {
    fn toolset_for_tool(&self, tool_name: &str) -> Option<&str> {
        self.groups.get(tool_name).map(String::as_str)
    }
}
