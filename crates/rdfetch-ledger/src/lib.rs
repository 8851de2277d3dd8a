//! rdfetch Ledger - durable classification record for lookup outcomes.
//!
//! Every identifier that completes processing lands in exactly one of
//! three lists (successful, unsuccessful, timed-out), persisted as flat
//! append-only text files so a crashed run can still be audited. The
//! outer retry loop reads the lists back to decide what to resubmit.
//!
//! # Example
//!
//! ```rust
//! use rdfetch_core::types::RdNumber;
//! use rdfetch_ledger::{Classification, ResultLedger};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let mut ledger = ResultLedger::open(
//!     &dir.path().join("successful.txt"),
//!     &dir.path().join("unsuccessful.txt"),
//!     &dir.path().join("timeout.txt"),
//! )?;
//!
//! let rd = RdNumber::new("JG", 4521)?;
//! ledger.record(&rd, Classification::TimedOut)?;
//!
//! // A later pass finds the record: the identifier moves lists
//! ledger.record(&rd, Classification::Successful)?;
//! assert_eq!(ledger.classification_of(&rd), Some(Classification::Successful));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod ledger;

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use ledger::{Classification, LedgerCounts, ResultLedger};
