use crate::error::{BrowserError, Result};
use crate::session::SessionHandle;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::stream::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;

/// Launch options for the underlying Chromium instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Window width in pixels
    pub window_width: u32,
    /// Window height in pixels
    pub window_height: u32,
    /// Timeout applied to individual CDP requests
    pub request_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Browser lifecycle manager handing out one disposable page per lookup attempt.
///
/// The browser process is launched lazily on the first session request and
/// relaunched transparently when it has died in the meantime, so a dead
/// session never poisons the next attempt.
pub struct BrowserEngine {
    inner: Mutex<Option<Browser>>,
    options: EngineOptions,
}

impl BrowserEngine {
    /// Create an engine. No browser process is started until the first session.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            inner: Mutex::new(None),
            options,
        }
    }

    /// Open a fresh session (a new page on the shared browser instance).
    ///
    /// If the running instance no longer responds, it is closed and a new one
    /// launched before the session is handed out.
    pub async fn new_session(&self) -> Result<SessionHandle> {
        let mut guard = self.inner.lock().await;

        if let Some(browser) = guard.as_ref() {
            match browser.new_page("about:blank").await {
                Ok(page) => return Ok(SessionHandle::new(page)),
                Err(err) => {
                    tracing::warn!("browser instance unresponsive, relaunching: {err}");
                    if let Some(mut dead) = guard.take() {
                        let _ = dead.close().await;
                    }
                }
            }
        }

        tracing::info!("launching browser (headless: {})", self.options.headless);
        let browser = Self::launch(&self.options).await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(BrowserError::from_cdp)?;
        *guard = Some(browser);
        Ok(SessionHandle::new(page))
    }

    /// Gracefully close the browser instance, if one is running.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(err) = browser.close().await {
                tracing::warn!("browser close error (non-fatal): {err}");
            }
        }
    }

    async fn launch(options: &EngineOptions) -> Result<Browser> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.window_width, options.window_height)
            .request_timeout(options.request_timeout)
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--disable-blink-features=AutomationControlled");
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drain CDP events for the lifetime of this instance
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!("cdp handler: {err}");
                }
            }
        });

        Ok(browser)
    }
}
