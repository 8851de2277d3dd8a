use crate::error::{BrowserError, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use std::time::{Duration, Instant};

/// Interval between condition checks while waiting on a page.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Page operations a lookup attempt drives on a live session.
///
/// [`SessionHandle`] implements this over a real CDP page; portal tests
/// implement it with scripted pages. All fallible methods surface a dead
/// transport as [`BrowserError::SessionInvalid`] so callers can run session
/// recovery instead of misclassifying the identifier.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the session to a URL.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Focus a form field and type a value into it.
    async fn fill_field(&self, selector: &str, value: &str) -> Result<()>;

    /// Click an element by selector.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait for a selector to appear.
    ///
    /// Returns `Ok(true)` once present, `Ok(false)` when the bound elapses
    /// first. Only a dead session is an error.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// One-shot check: does any element matching `selector` contain `needle`?
    async fn element_text_contains(&self, selector: &str, needle: &str) -> Result<bool>;

    /// One-shot check: does the current page title contain `needle`?
    async fn title_contains(&self, needle: &str) -> Result<bool>;

    /// Inject a solved reCAPTCHA token into the page's response element.
    async fn set_recaptcha_response(&self, token: &str) -> Result<()>;

    /// Full HTML source of the current page.
    async fn content(&self) -> Result<String>;

    /// URL the session is currently on, after any redirects.
    async fn current_url(&self) -> Result<String>;
}

/// A disposable automation session: one page, used for one lookup attempt,
/// then closed.
pub struct SessionHandle {
    page: Page,
}

impl SessionHandle {
    pub(crate) fn new(page: Page) -> Self {
        Self { page }
    }

    /// Print the current page to PDF bytes.
    pub async fn print_to_pdf(&self) -> Result<Vec<u8>> {
        self.page
            .pdf(PrintToPdfParams::default())
            .await
            .map_err(BrowserError::from_cdp)
    }

    /// Close the session's page. Errors are logged, not propagated; the
    /// attempt this session served is already over.
    pub async fn close(self) {
        if let Err(err) = self.page.close().await {
            tracing::debug!("page close error (non-fatal): {err}");
        }
    }

    async fn find(&self, selector: &str) -> Result<chromiumoxide::Element> {
        self.page.find_element(selector).await.map_err(|e| {
            let classified = BrowserError::from_cdp(e);
            if classified.is_session_invalid() {
                classified
            } else {
                BrowserError::SelectorNotFound(selector.to_string())
            }
        })
    }
}

#[async_trait]
impl BrowserSession for SessionHandle {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(|e| {
            let classified = BrowserError::from_cdp(e);
            match classified {
                BrowserError::SessionInvalid(_) | BrowserError::Timeout(_) => classified,
                other => BrowserError::NavigationError(other.to_string()),
            }
        })?;
        Ok(())
    }

    async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        let element = self.find(selector).await?;
        element.click().await.map_err(BrowserError::from_cdp)?;
        element.type_str(value).await.map_err(BrowserError::from_cdp)?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self.find(selector).await?;
        element.click().await.map_err(BrowserError::from_cdp)?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.find_element(selector).await {
                Ok(_) => return Ok(true),
                Err(err) => {
                    let classified = BrowserError::from_cdp(err);
                    if classified.is_session_invalid() {
                        return Err(classified);
                    }
                }
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn element_text_contains(&self, selector: &str, needle: &str) -> Result<bool> {
        let script = format!(
            "Array.from(document.querySelectorAll('{selector}')).some(el => el.innerText.includes('{needle}'))"
        );
        match self.page.evaluate(script).await {
            Ok(value) => Ok(value.into_value::<bool>().unwrap_or(false)),
            Err(err) => {
                let classified = BrowserError::from_cdp(err);
                if classified.is_session_invalid() {
                    Err(classified)
                } else {
                    // Transient evaluation failures (mid-navigation) read as "not yet"
                    Ok(false)
                }
            }
        }
    }

    async fn title_contains(&self, needle: &str) -> Result<bool> {
        match self.page.get_title().await {
            Ok(title) => Ok(title.is_some_and(|t| t.contains(needle))),
            Err(err) => {
                let classified = BrowserError::from_cdp(err);
                if classified.is_session_invalid() {
                    Err(classified)
                } else {
                    Ok(false)
                }
            }
        }
    }

    async fn set_recaptcha_response(&self, token: &str) -> Result<()> {
        let script =
            format!(r#"document.getElementById("g-recaptcha-response").innerHTML="{token}";"#);
        self.page
            .evaluate(script)
            .await
            .map_err(BrowserError::from_cdp)?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.map_err(BrowserError::from_cdp)
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await.map_err(BrowserError::from_cdp)?;
        url.ok_or_else(|| BrowserError::NavigationError("page has no URL".to_string()))
    }
}
