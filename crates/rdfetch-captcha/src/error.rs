//! Error types for the CAPTCHA solving subsystem.

use thiserror::Error;

/// Errors that can occur while obtaining a CAPTCHA solution.
#[derive(Error, Debug)]
pub enum CaptchaError {
    /// The service answered but rejected the request
    #[error("solving service rejected request: {code}")]
    Rejected {
        /// Service error code (e.g. `ERROR_WRONG_USER_KEY`)
        code: String,
    },

    /// HTTP-level error from the service
    #[error("solving service API error: status {status}, {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Response body could not be parsed
    #[error("failed to parse solving service response: {0}")]
    ParseError(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// No solution arrived within the per-attempt polling budget
    #[error("solution not ready after {seconds}s")]
    Timeout {
        /// Polling budget in seconds
        seconds: u64,
    },

    /// The full retry budget was consumed without a solution
    #[error("captcha solving failed after {attempts} attempts: {message}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Last underlying failure
        message: String,
    },
}

/// Result type alias for CAPTCHA operations.
pub type Result<T> = std::result::Result<T, CaptchaError>;
