//! rdfetch Pipeline - the resilience layer around portal lookups.
//!
//! Portals gated by CAPTCHAs and headless sessions fail in ways that are
//! mostly recoverable: sessions die, pages hang, verdicts never render.
//! This crate owns every retry decision so the portal clients can stay
//! single-attempt:
//!
//! - **Session recovery**: an identifier whose session dies is re-attempted
//!   on a fresh session, up to a fixed budget per pass
//! - **Stall watchdog**: when no identifier classifies for too long, the
//!   current identifier is abandoned and processing moves on
//! - **Convergence loop**: timeouts are folded forward and the whole range
//!   re-runs until a pass produces no legacy-site timeouts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod orchestrator;
pub mod watchdog;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use orchestrator::{LookupOrchestrator, PipelineTiming, RunReport};
pub use watchdog::StallWatchdog;
