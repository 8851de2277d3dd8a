//! rdfetch CAPTCHA - solving-service client for CAPTCHA-gated portals.
//!
//! This crate wraps a 2Captcha-protocol solving service behind a narrow
//! trait so the rest of the pipeline never deals with HTTP details or
//! retry bookkeeping.
//!
//! # Features
//!
//! - **Solver Abstraction**: One trait, swappable backends for testing
//! - **Bounded Retries**: Fixed attempt budget, every attempt costs quota
//! - **Submit/Poll Protocol**: The classic `in.php`/`res.php` flow
//!
//! # Example
//!
//! ```rust,no_run
//! use rdfetch_captcha::{CaptchaSolver, TwoCaptchaSolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let solver = TwoCaptchaSolver::new("api-key", "http://2captcha.com")?;
//! let token = solver
//!     .solve("site-key", "https://portal.example.gov/search")
//!     .await?;
//! println!("token: {token}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod solver;
pub mod two_captcha;

// Re-export commonly used types
pub use error::{CaptchaError, Result};
pub use solver::CaptchaSolver;
pub use two_captcha::TwoCaptchaSolver;
