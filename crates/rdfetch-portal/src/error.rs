//! Error types for portal interactions.

use rdfetch_browser::BrowserError;
use rdfetch_captcha::CaptchaError;
use thiserror::Error;

/// Result type for portal operations.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors that can occur while driving a portal.
///
/// These are per-identifier failures. The orchestrator catches them at the
/// identifier boundary and converts each into either a retry or a logged
/// classification; none of them aborts the run.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The underlying browser session died mid-interaction.
    #[error("browser session died: {0}")]
    SessionDied(String),

    /// An element the flow depends on never appeared in the page.
    #[error("expected page element missing: {0}")]
    ElementMissing(String),

    /// A browser-level call timed out below the portal's own bounded waits.
    #[error("browser call timed out: {0}")]
    Timeout(String),

    /// CAPTCHA solving failed after exhausting its retry budget.
    #[error("captcha solving failed: {0}")]
    Captcha(#[from] CaptchaError),

    /// Any other browser failure.
    #[error("browser error: {0}")]
    Browser(String),
}

impl From<BrowserError> for PortalError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::SessionInvalid(msg) => Self::SessionDied(msg),
            BrowserError::SelectorNotFound(selector) => Self::ElementMissing(selector),
            BrowserError::Timeout(msg) => Self::Timeout(msg),
            other => Self::Browser(other.to_string()),
        }
    }
}

impl PortalError {
    /// Whether this failure should trigger a session-recovery retry.
    #[must_use]
    pub fn is_session_died(&self) -> bool {
        matches!(self, Self::SessionDied(_))
    }

    /// Whether this failure classifies the identifier as timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
