//! Error types for the orchestration pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a whole run.
///
/// Per-identifier portal failures never surface here; they become
/// classifications or logged skips at the identifier boundary. What remains
/// is damage to the run's own record keeping.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The ledger could not be written; the run's durable record is broken.
    #[error(transparent)]
    Ledger(#[from] rdfetch_ledger::LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_passes_through() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = PipelineError::from(rdfetch_ledger::LedgerError::from(io));
        assert!(err.to_string().contains("disk full"));
    }
}
