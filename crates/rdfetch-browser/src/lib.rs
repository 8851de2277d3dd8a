//! Browser session management for CAPTCHA-gated portal automation.
//!
//! Provides headless Chromium control with disposable per-lookup sessions,
//! transparent relaunch after session death, and PDF rendering of captured
//! pages.

pub mod engine;
pub mod error;
pub mod render;
pub mod session;

pub use engine::{BrowserEngine, EngineOptions};
pub use error::{BrowserError, Result};
pub use render::{ChromiumRenderer, DocumentRenderer};
pub use session::{BrowserSession, SessionHandle};
