//! Solver trait for pluggable CAPTCHA backends.

use crate::error::Result;
use async_trait::async_trait;

/// A CAPTCHA solver producing a reCAPTCHA response token for one challenge.
///
/// Implementations own their retry policy; a returned token is final for the
/// form submission it was requested for and must not be re-requested.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Solve the challenge identified by `site_key` as presented on `page_url`.
    ///
    /// Returns the opaque solution token on success.
    async fn solve(&self, site_key: &str, page_url: &str) -> Result<String>;
}
