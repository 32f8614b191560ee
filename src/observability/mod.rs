//! # Observability Infrastructure
//!
//! Structured logging for the gateway. HTTP request spans come from
//! `tower_http::trace::TraceLayer` in [`crate::api::server`].

pub mod logging;

pub use logging::{init_logging, log_config_info};
