//! Error types for ledger operations.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while maintaining the result ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Underlying file I/O failed.
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
}
