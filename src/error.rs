//! Error types for hunt.
//!
//! Uses `thiserror` for ergonomic error definitions. Probe failures are not
//! errors: they are reported as [`PortOutcome`](crate::scanner::PortOutcome)
//! data. Only setup mistakes end up here.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration and setup errors.
///
/// These surface before any port is probed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("HTTP detection requires a virtual host")]
    MissingVirtualHost,

    #[error("invalid header value for {name}: {value:?}")]
    InvalidHeader { name: &'static str, value: String },

    #[error("invalid pattern for {service} detector: {reason}")]
    InvalidPattern { service: String, reason: String },

    #[error("invalid setting {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {}: {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] crate::types::PortError),

    #[error(transparent)]
    Target(#[from] crate::types::TargetError),

    #[error("output failed: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
