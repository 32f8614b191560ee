//! # Error Handling
//!
//! Crate-level error type for startup and wiring failures. Errors that happen while
//! a request is being filtered never use this type: they are rendered as JSON-RPC
//! errors by [`crate::mcp::error::ToolAccessError`].

/// Custom result type for toolgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for toolgate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration values that loaded but are not acceptable
    #[error("Validation error: {0}")]
    Validation(String),

    /// Module or tool lookup tables that failed startup validation
    #[error("Registry error: {0}")]
    Registry(String),

    /// Network transport errors (HTTP listener, upstream client construction)
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::Registry(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(format!("Validation failed: {}", errors))
    }
}
