//! # toolgate
//!
//! License-aware tool authorization and filtering for MCP servers.
//!
//! Sits in front of an MCP server and limits the tools an account can discover and
//! invoke to the toolsets its product licenses allow:
//!
//! ```text
//! identity → classify → enrich (licenses → modules → toolsets)
//!                         ├─ tools/call: authorize before the upstream
//!                         └─ tools/list: filter the upstream reply
//! ```
//!
//! ## Core Components
//!
//! - [`license`]: license cache, License API client and resolver
//! - [`toolsets`]: module → toolset and tool → toolset lookup tables
//! - [`filter`]: request classification, context enrichment, list filtering and
//!   call authorization, packaged as axum middleware
//! - [`api`]: router, identity middleware and upstream proxy

pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod license;
pub mod mcp;
pub mod observability;
pub mod toolsets;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
