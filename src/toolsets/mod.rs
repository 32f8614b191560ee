//! # Toolsets
//!
//! Lookup tables that turn modules into toolsets and tools into their owning toolset.

pub mod mapper;
pub mod registry;
pub mod tracker;

pub use mapper::ToolsetMapper;
pub use registry::{ModuleRegistry, ModuleToolsets};
pub use tracker::{ToolGroupTracker, ToolTracker};
