//! rdfetch Portal - clients for the two CAPTCHA-gated crash-report sites.
//!
//! The new-style portal answers whether a record exists; the legacy portal
//! serves the record page itself. Both follow the same shape per attempt:
//! fresh session, bounded wait for the form, fill, solve the CAPTCHA,
//! inject the token, submit, then interpret what the page does next.
//!
//! # Features
//!
//! - **One Session Per Attempt**: sessions are disposable, never reused
//!   across identifiers or retries
//! - **Classified Outcomes**: page behavior maps to `Found` / `NotFound` /
//!   `TimedOut` verdicts, never raw page state
//! - **Recovery-Ready Errors**: a dead session surfaces as
//!   [`PortalError::SessionDied`] so the orchestrator can retry the same
//!   identifier on a new session

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
pub mod new_site;
pub mod old_site;
pub mod outcome;

// Re-export commonly used types
pub use client::{RecordCapture, RecordSearch};
pub use error::{PortalError, Result};
pub use new_site::NewSiteClient;
pub use old_site::OldSiteClient;
pub use outcome::{CaptureOutcome, LookupOutcome};
