//! # Configuration Management
//!
//! Layered configuration: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `TOOLGATE__` (nested keys separated by `__`,
//! e.g. `TOOLGATE__LICENSE__API_KEY`). The merged result is validated before use.

pub mod settings;

pub use settings::{
    AppConfig, FilterConfig, IdentityConfig, LicenseConfig, ObservabilityConfig, ServerConfig,
    UpstreamConfig,
};

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

use crate::errors::{Error, Result};

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "TOOLGATE";

/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

impl AppConfig {
    /// Load and validate configuration
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&AppConfig::default())
                .map_err(|e| Error::config_with_source("Failed to serialize defaults", Box::new(e)))?,
        );

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder =
                builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX).prefix_separator(ENV_SEPARATOR).separator(ENV_SEPARATOR),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
