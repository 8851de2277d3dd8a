//! Client for the legacy crash-report portal.
//!
//! Identifiers reach this client only after the new site confirmed a record
//! exists. The legacy site serves the record page directly after its own
//! form-and-CAPTCHA dance, so a capture grabs the rendered HTML and hands
//! it to the document renderer. Rendering is best-effort: losing the PDF
//! does not un-capture the record.

use crate::client::RecordCapture;
use crate::error::Result;
use crate::outcome::CaptureOutcome;
use async_trait::async_trait;
use rdfetch_browser::{BrowserEngine, BrowserSession, DocumentRenderer};
use rdfetch_captcha::CaptchaSolver;
use rdfetch_core::types::{CrashDate, RdNumber};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Pause before opening a session, pacing successive captures.
const PRE_NAV_DELAY: Duration = Duration::from_secs(5);

/// Bound on the search form appearing after navigation.
const FORM_WAIT: Duration = Duration::from_secs(60);

/// Pause after token injection so the page registers it before submit.
const TOKEN_SETTLE: Duration = Duration::from_secs(5);

/// Pause after submit for the record page to load before scraping it.
const POST_SUBMIT_SETTLE: Duration = Duration::from_secs(5);

/// Identifier input field.
const RD_FIELD: &str = "#rd";
/// Crash date input field.
const DATE_FIELD: &str = "#crashDate";
/// Form submit control.
const SUBMIT_BUTTON: &str = "input[type='submit']";

/// Captures record pages from the legacy portal.
pub struct OldSiteClient {
    engine: Arc<BrowserEngine>,
    solver: Arc<dyn CaptchaSolver>,
    renderer: Arc<dyn DocumentRenderer>,
    url: String,
    site_key: String,
    artifact_dir: PathBuf,
}

impl OldSiteClient {
    /// Create a client for the portal at `url` protected by `site_key`.
    ///
    /// Rendered artifacts are written under `artifact_dir`, named by
    /// identifier and crash date.
    pub fn new(
        engine: Arc<BrowserEngine>,
        solver: Arc<dyn CaptchaSolver>,
        renderer: Arc<dyn DocumentRenderer>,
        url: impl Into<String>,
        site_key: impl Into<String>,
        artifact_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            solver,
            renderer,
            url: url.into(),
            site_key: site_key.into(),
            artifact_dir: artifact_dir.into(),
        }
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        rd: &RdNumber,
        date: &CrashDate,
    ) -> Result<CaptureOutcome> {
        session.navigate(&self.url).await?;

        if !session.wait_for_selector(RD_FIELD, FORM_WAIT).await? {
            tracing::debug!(%rd, "legacy search form did not render in time");
            return Ok(CaptureOutcome::TimedOut);
        }
        session.fill_field(RD_FIELD, &rd.to_string()).await?;
        session.fill_field(DATE_FIELD, date.as_str()).await?;

        // Solve against the landed page, not the configured URL
        let page_url = session.current_url().await?;
        let token = self.solver.solve(&self.site_key, &page_url).await?;
        session.set_recaptcha_response(&token).await?;
        sleep(TOKEN_SETTLE).await;

        session.click(SUBMIT_BUTTON).await?;
        sleep(POST_SUBMIT_SETTLE).await;

        let html = session.content().await?;
        let artifact = self.render_artifact(rd, date, &html).await;
        Ok(CaptureOutcome::Captured { artifact })
    }

    /// Render the captured page to its artifact path. Failures degrade the
    /// capture to "no artifact" rather than erroring the identifier.
    async fn render_artifact(
        &self,
        rd: &RdNumber,
        date: &CrashDate,
        html: &str,
    ) -> Option<PathBuf> {
        let path = artifact_path(&self.artifact_dir, rd, date);
        match self.renderer.render_to_file(html, &path).await {
            Ok(()) => {
                tracing::info!(%rd, path = %path.display(), "record artifact rendered");
                Some(path)
            }
            Err(err) => {
                tracing::warn!(%rd, "rendering failed, record kept without artifact: {err}");
                None
            }
        }
    }
}

#[async_trait]
impl RecordCapture for OldSiteClient {
    async fn capture(&self, rd: &RdNumber, date: &CrashDate) -> Result<CaptureOutcome> {
        sleep(PRE_NAV_DELAY).await;
        let session = self.engine.new_session().await?;
        let outcome = self.drive(&session, rd, date).await;
        session.close().await;
        outcome
    }
}

fn artifact_path(dir: &Path, rd: &RdNumber, date: &CrashDate) -> PathBuf {
    dir.join(format!("{rd}_{}.pdf", date.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfetch_browser::{BrowserError, EngineOptions};
    use std::sync::Mutex;

    /// Scripted page for the legacy flow: form renders at once, the record
    /// page HTML is canned.
    struct ScriptedPage {
        landed_url: String,
        filled: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedPage {
        fn new(landed_url: &str) -> Self {
            Self {
                landed_url: landed_url.to_string(),
                filled: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedPage {
        async fn navigate(&self, _url: &str) -> rdfetch_browser::Result<()> {
            Ok(())
        }

        async fn fill_field(&self, selector: &str, value: &str) -> rdfetch_browser::Result<()> {
            self.filled
                .lock()
                .unwrap()
                .push((selector.to_string(), value.to_string()));
            Ok(())
        }

        async fn click(&self, _selector: &str) -> rdfetch_browser::Result<()> {
            Ok(())
        }

        async fn wait_for_selector(
            &self,
            _selector: &str,
            _timeout: Duration,
        ) -> rdfetch_browser::Result<bool> {
            Ok(true)
        }

        async fn element_text_contains(
            &self,
            _selector: &str,
            _needle: &str,
        ) -> rdfetch_browser::Result<bool> {
            Ok(false)
        }

        async fn title_contains(&self, _needle: &str) -> rdfetch_browser::Result<bool> {
            Ok(false)
        }

        async fn set_recaptcha_response(&self, _token: &str) -> rdfetch_browser::Result<()> {
            Ok(())
        }

        async fn content(&self) -> rdfetch_browser::Result<String> {
            Ok("<html><body>Crash Report</body></html>".to_string())
        }

        async fn current_url(&self) -> rdfetch_browser::Result<String> {
            Ok(self.landed_url.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSolver {
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl CaptchaSolver for RecordingSolver {
        async fn solve(&self, site_key: &str, page_url: &str) -> rdfetch_captcha::Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((site_key.to_string(), page_url.to_string()));
            Ok("tok-1".to_string())
        }
    }

    #[derive(Default)]
    struct ScriptedRenderer {
        fail: bool,
        rendered: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl DocumentRenderer for ScriptedRenderer {
        async fn render_to_file(&self, _html: &str, path: &Path) -> rdfetch_browser::Result<()> {
            if self.fail {
                return Err(BrowserError::Render("print target gone".to_string()));
            }
            self.rendered.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn client(
        solver: Arc<dyn CaptchaSolver>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> OldSiteClient {
        OldSiteClient::new(
            Arc::new(BrowserEngine::new(EngineOptions::default())),
            solver,
            renderer,
            "https://legacy.example.gov/crash",
            "legacy-key",
            "reports",
        )
    }

    fn rd() -> RdNumber {
        RdNumber::new("JG", 1).expect("valid identifier")
    }

    fn date() -> CrashDate {
        CrashDate::new("01-15-2024").expect("valid date")
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_solves_for_landed_page() {
        let solver = Arc::new(RecordingSolver::default());
        let renderer = Arc::new(ScriptedRenderer::default());
        let client = client(solver.clone(), renderer.clone());
        let page = ScriptedPage::new("https://legacy.example.gov/crash/search?sid=9f2");

        let outcome = client.drive(&page, &rd(), &date()).await.expect("drive");

        let expected = PathBuf::from("reports/JG000001_01-15-2024.pdf");
        assert_eq!(
            outcome,
            CaptureOutcome::Captured {
                artifact: Some(expected.clone())
            }
        );
        assert_eq!(renderer.rendered.lock().unwrap().as_slice(), [expected]);

        // The session redirected; the solve must name that page
        let seen = solver.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "legacy-key");
        assert_eq!(seen[0].1, "https://legacy.example.gov/crash/search?sid=9f2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failure_keeps_capture_without_artifact() {
        let solver = Arc::new(RecordingSolver::default());
        let renderer = Arc::new(ScriptedRenderer {
            fail: true,
            ..ScriptedRenderer::default()
        });
        let client = client(solver, renderer);
        let page = ScriptedPage::new("https://legacy.example.gov/crash");

        let outcome = client.drive(&page, &rd(), &date()).await.expect("drive");

        assert_eq!(outcome, CaptureOutcome::Captured { artifact: None });
    }

    #[test]
    fn test_artifact_path_names_by_identifier_and_date() {
        let rd = RdNumber::new("JG", 123_456).expect("valid identifier");
        let date = CrashDate::new("01-15-2024").expect("valid date");

        let path = artifact_path(Path::new("reports"), &rd, &date);
        assert_eq!(path, PathBuf::from("reports/JG123456_01-15-2024.pdf"));
    }

    #[test]
    fn test_form_selectors() {
        // Legacy portal uses bare ids, unlike the new site's namespaced ones
        assert_eq!(RD_FIELD, "#rd");
        assert_eq!(DATE_FIELD, "#crashDate");
        assert_eq!(SUBMIT_BUTTON, "input[type='submit']");
    }
}
