//! rdfetch Core - Foundation crate for the rdfetch crash-report retriever.
//!
//! This crate provides the shared types, error handling, and configuration
//! management that all other rdfetch crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG fallback paths
//! - [`types`] - Domain newtypes (`RdNumber`, `RdRange`, `CrashDate`)
//!
//! # Example
//!
//! ```rust
//! use rdfetch_core::{CrashDate, RdRange};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let range = RdRange::new("JG", 1, 3)?;
//! let date = CrashDate::new("01-15-2024")?;
//!
//! for rd in range.iter() {
//!     println!("{rd} on {date}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CaptchaConfig, OutputConfig, PortalsConfig, RunConfig,
};
pub use error::{ConfigError, ConfigResult, RdFetchError, Result};
pub use types::{CrashDate, RdNumber, RdRange};
