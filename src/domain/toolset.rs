//! The allowed-toolset set: the only authorization artifact a filtered request carries.

use std::collections::BTreeSet;
use std::fmt;

/// Toolset every filtered request may use
pub const DEFAULT_TOOLSET: &str = "default";

/// Set of toolset names a request may discover and call.
///
/// Built by [`crate::toolsets::ToolsetMapper::toolsets_for_modules`], which always
/// adds [`DEFAULT_TOOLSET`]. An empty set is still representable and denies every
/// tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedToolsets {
    toolsets: BTreeSet<String>,
}

impl AllowedToolsets {
    /// A set that allows nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, toolset: impl Into<String>) -> bool {
        self.toolsets.insert(toolset.into())
    }

    pub fn contains(&self, toolset: &str) -> bool {
        self.toolsets.contains(toolset)
    }

    /// Toolset names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.toolsets.iter().map(String::as_str)
    }

    /// Toolset names in sorted order, owned
    pub fn to_vec(&self) -> Vec<String> {
        self.toolsets.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.toolsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolsets.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedToolsets {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { toolsets: iter.into_iter().map(Into::into).collect() }
    }
}

impl fmt::Display for AllowedToolsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", names.join(", "))
    }
}
