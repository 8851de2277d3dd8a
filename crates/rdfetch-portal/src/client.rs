//! Traits the orchestrator drives portals through.
//!
//! Each call is one complete attempt against a fresh browser session. The
//! orchestrator owns all retry policy; implementations report what happened
//! and never retry an identifier themselves.

use crate::error::Result;
use crate::outcome::{CaptureOutcome, LookupOutcome};
use async_trait::async_trait;
use rdfetch_core::types::{CrashDate, RdNumber};

/// Searches the new-style portal for a crash-report record.
#[async_trait]
pub trait RecordSearch: Send + Sync {
    /// Run one complete search attempt for `rd`.
    ///
    /// Returns the classified verdict, or an error for conditions the
    /// orchestrator must resolve (dead session, missing element, failed
    /// CAPTCHA solve).
    async fn search(&self, rd: &RdNumber, date: &CrashDate) -> Result<LookupOutcome>;
}

/// Retrieves record pages from the legacy portal.
#[async_trait]
pub trait RecordCapture: Send + Sync {
    /// Run one complete capture attempt for `rd`.
    async fn capture(&self, rd: &RdNumber, date: &CrashDate) -> Result<CaptureOutcome>;
}
