//! # Configuration Settings
//!
//! Defines the configuration structure for the toolgate gateway.

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

use crate::api::server::HEALTH_PATH;
use crate::errors::{Error, Result};
use crate::filter::{ListFailureMode, MissingModulesPolicy};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener
    #[validate(nested)]
    pub server: ServerConfig,

    /// Upstream MCP server
    #[validate(nested)]
    pub upstream: UpstreamConfig,

    /// License API and cache
    #[validate(nested)]
    pub license: LicenseConfig,

    /// Tool filtering policy
    #[validate(nested)]
    pub filter: FilterConfig,

    /// Where the account identity comes from
    #[validate(nested)]
    pub identity: IdentityConfig,

    /// Logging
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Module → toolsets override; the built-in table is used when empty
    pub toolsets: BTreeMap<String, Vec<String>>,

    /// Toolset → tool names, feeding the tool tracker
    pub tool_groups: BTreeMap<String, Vec<String>>,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()?;
        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if !self.server.mcp_path.starts_with('/') {
            return Err(Error::validation("server.mcp_path must start with '/'"));
        }

        if self.server.mcp_path == HEALTH_PATH {
            return Err(Error::validation(format!(
                "server.mcp_path cannot be {}",
                HEALTH_PATH
            )));
        }

        if HeaderName::from_bytes(self.identity.account_header.as_bytes()).is_err() {
            return Err(Error::validation(format!(
                "identity.account_header '{}' is not a valid header name",
                self.identity.account_header
            )));
        }

        if self.identity.account_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(Error::validation("identity.account_id cannot be blank"));
        }

        if self.license.api_key.as_deref().is_some_and(|key| key.trim().is_empty()) {
            return Err(Error::validation("license.api_key cannot be blank"));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Path of the filtered MCP endpoint
    #[validate(length(min = 1, message = "MCP path cannot be empty"))]
    pub mcp_path: String,

    /// Maximum request body size in bytes
    #[validate(range(min = 1024, message = "Max body size must be at least 1KB"))]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            mcp_path: "/mcp".to_string(),
            max_body_size: 4 * 1024 * 1024, // 4MB
        }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL requests are forwarded to
    #[validate(url(message = "Upstream URL must be a valid URL"))]
    pub url: String,

    /// Upstream request timeout in seconds
    #[validate(range(min = 1, max = 3600, message = "Timeout must be between 1 and 3600 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { url: "http://127.0.0.1:8081/mcp".to_string(), timeout_seconds: 60 }
    }
}

impl UpstreamConfig {
    /// Get upstream timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// License API and license cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LicenseConfig {
    /// Gateway base URL the license endpoint is joined onto
    #[validate(url(message = "License base URL must be a valid URL"))]
    pub base_url: String,

    /// Sent as `x-api-key`
    pub api_key: Option<String>,

    /// How long a resolved entitlement stays cached
    #[validate(range(min = 1, max = 604800, message = "License cache TTL must be between 1 second and 7 days"))]
    pub license_cache_ttl_seconds: u64,

    /// How often expired entries are swept
    #[validate(range(min = 1, max = 604800, message = "License cache clean interval must be between 1 second and 7 days"))]
    pub license_cache_clean_interval_seconds: u64,

    /// Deadline for one License API call
    #[validate(range(min = 1, max = 300, message = "Request timeout must be between 1 and 300 seconds"))]
    pub request_timeout_seconds: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.harness.io/gateway".to_string(),
            api_key: None,
            license_cache_ttl_seconds: 30 * 60,
            license_cache_clean_interval_seconds: 5 * 60,
            request_timeout_seconds: 10,
        }
    }
}

impl LicenseConfig {
    /// Get the cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.license_cache_ttl_seconds)
    }

    /// Get the sweep interval as Duration
    pub fn cache_clean_interval(&self) -> Duration {
        Duration::from_secs(self.license_cache_clean_interval_seconds)
    }

    /// Get the License API deadline as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Tool filtering policy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FilterConfig {
    /// Behaviour for identified requests without `X-Harness-Modules`
    pub missing_modules_header: MissingModulesPolicy,

    /// Behaviour when a `tools/list` reply cannot be filtered
    pub list_failure_mode: ListFailureMode,

    /// Maximum buffered `tools/list` response size in bytes
    #[validate(range(min = 1024, message = "Max response body size must be at least 1KB"))]
    pub max_response_body_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            missing_modules_header: MissingModulesPolicy::default(),
            list_failure_mode: ListFailureMode::default(),
            max_response_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Account identity configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IdentityConfig {
    /// Trusted header carrying an already-authenticated account id
    #[validate(length(min = 1, message = "Account header cannot be empty"))]
    pub account_header: String,

    /// Account id used when the header is absent
    pub account_id: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { account_header: "Harness-Account".to_string(), account_id: None }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter directive, overridden by `RUST_LOG`
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit logs as JSON
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}
