//! Classified results of portal interactions.

use std::path::PathBuf;

/// Outcome of a new-site record search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The portal offered the record for purchase: a crash report exists.
    Found,

    /// The portal showed its no-record banner.
    NotFound,

    /// Neither verdict appeared within the bounded waits.
    TimedOut,
}

impl LookupOutcome {
    /// Check if the outcome confirms a record exists.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found)
    }

    /// Check if the outcome is a timeout.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Outcome of an old-site record capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The record page was retrieved.
    Captured {
        /// Path of the rendered document, absent when rendering failed.
        artifact: Option<PathBuf>,
    },

    /// The search form never appeared within the bounded wait.
    TimedOut,
}

impl CaptureOutcome {
    /// Check if the record page was retrieved, with or without an artifact.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }

    /// Check if the outcome is a timeout.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}
