//! # Structured Logging
//!
//! Subscriber setup and startup logging built on the tracing ecosystem.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `observability.log_level`. A subscriber that is
/// already installed (integration tests, embedding applications) is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    // A subscriber set earlier (integration tests) stays in place.
    let _ = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    Ok(())
}

/// Log the effective configuration at startup. Never logs the License API key.
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        mcp_path = %config.server.mcp_path,
        upstream_url = %config.upstream.url,
        license_base_url = %config.license.base_url,
        license_api_key_set = config.license.api_key.is_some(),
        license_cache_ttl_secs = config.license.license_cache_ttl_seconds,
        license_cache_clean_interval_secs = config.license.license_cache_clean_interval_seconds,
        missing_modules_header = ?config.filter.missing_modules_header,
        list_failure_mode = ?config.filter.list_failure_mode,
        account_header = %config.identity.account_header,
        static_account = config.identity.account_id.is_some(),
        custom_toolsets = !config.toolsets.is_empty(),
        tool_groups = config.tool_groups.len(),
        "toolgate configuration"
    );
}
