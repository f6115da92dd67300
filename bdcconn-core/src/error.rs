//! Error types for `bdcconn`
//!
//! This module defines all error types used throughout the `bdcconn` core,
//! providing descriptive error messages for configuration persistence and
//! connection coordination operations.
//!
//! Connection *failures* reported by a provider are not errors in this
//! taxonomy: they resolve into a [`crate::connection::ConnectionResult`]
//! delivered through the normal success path. Only configuration-class
//! problems (unknown provider or flavor, broken service wiring, unreadable
//! config files) surface as `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for `bdcconn` operations
#[derive(Debug, Error)]
pub enum BdcError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connection coordination errors
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The reason for validation failure
        reason: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Failed to deserialize configuration
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(String),
}

/// Fatal errors raised by the connection coordinator
///
/// These are configuration-class failures: they are surfaced synchronously,
/// never retried, and never folded into a `ConnectionResult`.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No provider registered under the requested name
    #[error("No connection provider registered for '{0}'")]
    UnknownProvider(String),

    /// A collaborating service failed in a way the coordinator cannot recover from
    #[error("Connection service '{service}' failed: {reason}")]
    Service {
        /// The collaborator that failed (dialog, store, accounts, ...)
        service: &'static str,
        /// The reason reported by the collaborator
        reason: String,
    },
}

/// Result type alias for `bdcconn` operations
pub type Result<T> = std::result::Result<T, BdcError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for connection coordination operations
pub type CoordinationResult<T> = std::result::Result<T, ConnectionError>;
