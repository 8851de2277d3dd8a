//! Core error types for the rdfetch application.
//!
//! This module defines the central error type used across all subsystems.
//! Each subsystem error is represented as a variant for clear error propagation.

use thiserror::Error;

/// Central error type for all rdfetch operations.
///
/// Each variant represents an error from a specific subsystem, allowing
/// for clear error propagation and handling across module boundaries.
#[derive(Error, Debug)]
pub enum RdFetchError {
    /// Configuration errors (file loading, parsing, missing values)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid operator input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// Browser automation errors (navigation, element not found, dead session)
    #[error("browser error: {0}")]
    Browser(String),

    /// CAPTCHA solving errors (service rejection, budget exhausted)
    #[error("captcha error: {0}")]
    Captcha(String),

    /// Portal interaction errors (form flow, classification)
    #[error("portal error: {0}")]
    Portal(String),

    /// Result ledger errors (file append, replay)
    #[error("ledger error: {0}")]
    Ledger(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found at an explicitly requested path
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required value is absent and has no default
    #[error("missing required config value: {field}")]
    MissingValue {
        /// Dotted key of the missing value
        field: String,
    },

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `RdFetchError`.
pub type Result<T> = std::result::Result<T, RdFetchError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
