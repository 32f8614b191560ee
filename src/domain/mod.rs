//! Domain types shared by the license resolver, the toolset mapper and the filter.

pub mod account;
pub mod module;
pub mod toolset;

pub use account::AccountId;
pub use module::{AllowedModules, LicensedModules, Module, RequestedModules, UnknownModule};
pub use toolset::{AllowedToolsets, DEFAULT_TOOLSET};
