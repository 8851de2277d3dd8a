//! Client for the new-style crash-report portal.
//!
//! One search here answers a single question: does a purchasable crash
//! report exist for the identifier? The portal signals "no" with an error
//! banner and "yes" by moving to its purchase page, so after submitting the
//! form the client races both signals against their own bounds.

use crate::client::RecordSearch;
use crate::error::Result;
use crate::outcome::LookupOutcome;
use async_trait::async_trait;
use rdfetch_browser::{BrowserEngine, BrowserSession};
use rdfetch_captcha::CaptchaSolver;
use rdfetch_core::types::{CrashDate, RdNumber};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Pause before opening a session, pacing successive lookups.
const PRE_NAV_DELAY: Duration = Duration::from_secs(5);

/// Bound on the search form appearing after navigation.
const FORM_WAIT: Duration = Duration::from_secs(60);

/// Pause after token injection so the page registers it before submit.
const TOKEN_SETTLE: Duration = Duration::from_secs(5);

/// Bound on the no-record banner appearing after submit.
const BANNER_WAIT: Duration = Duration::from_secs(30);

/// Bound on the purchase page appearing after submit.
const TITLE_WAIT: Duration = Duration::from_secs(60);

/// Interval between verdict checks after submit.
const VERDICT_POLL: Duration = Duration::from_millis(500);

/// Radio button selecting search-by-identifier mode.
const SEARCH_OPTION: &str = "#SearchOption";
/// Identifier input field.
const RD_FIELD: &str = "#SearchByRdNumberData_rd";
/// Crash date input field.
const DATE_FIELD: &str = "#SearchByRdNumberData_cd";
/// Form submit button.
const SUBMIT_BUTTON: &str = "button[name='btnSubmit']";
/// Banner element shown when no record exists.
const NO_RECORD_BANNER: &str = ".alert-danger";
/// Banner text confirming the no-record verdict.
const NO_RECORD_TEXT: &str = "No crash report could be found";
/// Title fragment of the purchase page.
const PURCHASE_TITLE: &str = "Purchase - Traffic Crash Reports";

/// Searches the new-style portal, one fresh session per attempt.
pub struct NewSiteClient {
    engine: Arc<BrowserEngine>,
    solver: Arc<dyn CaptchaSolver>,
    url: String,
    site_key: String,
}

impl NewSiteClient {
    /// Create a client for the portal at `url` protected by `site_key`.
    pub fn new(
        engine: Arc<BrowserEngine>,
        solver: Arc<dyn CaptchaSolver>,
        url: impl Into<String>,
        site_key: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            solver,
            url: url.into(),
            site_key: site_key.into(),
        }
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        rd: &RdNumber,
        date: &CrashDate,
    ) -> Result<LookupOutcome> {
        session.navigate(&self.url).await?;

        if !session.wait_for_selector(SEARCH_OPTION, FORM_WAIT).await? {
            tracing::debug!(%rd, "search form did not render in time");
            return Ok(LookupOutcome::TimedOut);
        }
        session.click(SEARCH_OPTION).await?;
        session.fill_field(RD_FIELD, &rd.to_string()).await?;
        session.fill_field(DATE_FIELD, date.as_str()).await?;

        // The portal can redirect after navigation; tokens verify only
        // against the page the form actually lives on
        let page_url = session.current_url().await?;
        let token = self.solver.solve(&self.site_key, &page_url).await?;
        session.set_recaptcha_response(&token).await?;
        sleep(TOKEN_SETTLE).await;

        session.click(SUBMIT_BUTTON).await?;
        self.await_verdict(session, rd).await
    }

    /// Race the no-record banner against the purchase page.
    ///
    /// The banner has the shorter window; once it lapses only the purchase
    /// title can still decide. Whichever signal appears first wins.
    async fn await_verdict(
        &self,
        session: &dyn BrowserSession,
        rd: &RdNumber,
    ) -> Result<LookupOutcome> {
        let submitted = Instant::now();
        loop {
            if submitted.elapsed() < BANNER_WAIT
                && session
                    .element_text_contains(NO_RECORD_BANNER, NO_RECORD_TEXT)
                    .await?
            {
                return Ok(LookupOutcome::NotFound);
            }
            if session.title_contains(PURCHASE_TITLE).await? {
                return Ok(LookupOutcome::Found);
            }
            if submitted.elapsed() >= TITLE_WAIT {
                tracing::debug!(%rd, "no verdict within the bounded waits");
                return Ok(LookupOutcome::TimedOut);
            }
            sleep(VERDICT_POLL).await;
        }
    }
}

#[async_trait]
impl RecordSearch for NewSiteClient {
    async fn search(&self, rd: &RdNumber, date: &CrashDate) -> Result<LookupOutcome> {
        sleep(PRE_NAV_DELAY).await;
        let session = self.engine.new_session().await?;
        let outcome = self.drive(&session, rd, date).await;
        session.close().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortalError;
    use rdfetch_browser::EngineOptions;
    use rdfetch_captcha::CaptchaError;
    use std::sync::Mutex;

    /// Scripted page: every wait resolves immediately with the configured
    /// answer, so a drive runs the full flow without a browser.
    struct ScriptedPage {
        landed_url: String,
        form_present: bool,
        banner: bool,
        purchase_page: bool,
        filled: Mutex<Vec<(String, String)>>,
        token: Mutex<Option<String>>,
    }

    impl ScriptedPage {
        fn new(landed_url: &str) -> Self {
            Self {
                landed_url: landed_url.to_string(),
                form_present: true,
                banner: false,
                purchase_page: false,
                filled: Mutex::new(Vec::new()),
                token: Mutex::new(None),
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
            Ok(self.form_present)
        }

        async fn element_text_contains(
            &self,
            _selector: &str,
            _needle: &str,
        ) -> rdfetch_browser::Result<bool> {
            Ok(self.banner)
        }

        async fn title_contains(&self, _needle: &str) -> rdfetch_browser::Result<bool> {
            Ok(self.purchase_page)
        }

        async fn set_recaptcha_response(&self, token: &str) -> rdfetch_browser::Result<()> {
            *self.token.lock().unwrap() = Some(token.to_string());
            Ok(())
        }

        async fn content(&self) -> rdfetch_browser::Result<String> {
            Ok("<html></html>".to_string())
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

    struct StubSolver;

    #[async_trait]
    impl CaptchaSolver for StubSolver {
        async fn solve(&self, _site_key: &str, _page_url: &str) -> rdfetch_captcha::Result<String> {
            Err(CaptchaError::Exhausted {
                attempts: 3,
                message: "stub".to_string(),
            })
        }
    }

    fn client(solver: Arc<dyn CaptchaSolver>) -> NewSiteClient {
        NewSiteClient::new(
            Arc::new(BrowserEngine::new(EngineOptions::default())),
            solver,
            "https://crashreports.example.gov/search",
            "site-key",
        )
    }

    fn rd() -> RdNumber {
        RdNumber::new("JG", 1).expect("valid identifier")
    }

    fn date() -> CrashDate {
        CrashDate::new("01-15-2024").expect("valid date")
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_solved_for_landed_page() {
        let solver = Arc::new(RecordingSolver::default());
        let client = client(solver.clone());
        let page = ScriptedPage {
            purchase_page: true,
            ..ScriptedPage::new("https://crashreports.example.gov/Search/RdNumber?tab=rd")
        };

        let outcome = client.drive(&page, &rd(), &date()).await.expect("drive");

        assert_eq!(outcome, LookupOutcome::Found);
        // The portal moved off the configured URL; the solve must follow it
        let seen = solver.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "site-key");
        assert_eq!(
            seen[0].1,
            "https://crashreports.example.gov/Search/RdNumber?tab=rd"
        );
        assert_eq!(page.token.lock().unwrap().as_deref(), Some("tok-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_classifies_not_found() {
        let solver = Arc::new(RecordingSolver::default());
        let client = client(solver.clone());
        let page = ScriptedPage {
            banner: true,
            ..ScriptedPage::new("https://crashreports.example.gov/search")
        };

        let outcome = client.drive(&page, &rd(), &date()).await.expect("drive");

        assert_eq!(outcome, LookupOutcome::NotFound);
        let filled = page.filled.lock().unwrap();
        assert_eq!(filled.len(), 2);
        assert_eq!(filled[0], (RD_FIELD.to_string(), "JG000001".to_string()));
        assert_eq!(filled[1], (DATE_FIELD.to_string(), "01-15-2024".to_string()));
    }

    #[tokio::test]
    async fn test_missing_form_times_out_before_solving() {
        let solver = Arc::new(RecordingSolver::default());
        let client = client(solver.clone());
        let page = ScriptedPage {
            form_present: false,
            ..ScriptedPage::new("https://crashreports.example.gov/search")
        };

        let outcome = client.drive(&page, &rd(), &date()).await.expect("drive");

        // No quota spent on a form that never rendered
        assert_eq!(outcome, LookupOutcome::TimedOut);
        assert!(solver.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_verdict_windows() {
        // The banner window must stay inside the title window for the race
        // to degrade into a plain title wait rather than an early timeout
        assert!(BANNER_WAIT < TITLE_WAIT);
        assert_eq!(BANNER_WAIT, Duration::from_secs(30));
        assert_eq!(TITLE_WAIT, Duration::from_secs(60));
        assert_eq!(FORM_WAIT, Duration::from_secs(60));
    }

    #[test]
    fn test_client_construction() {
        let client = client(Arc::new(StubSolver));
        assert_eq!(client.url, "https://crashreports.example.gov/search");
        assert_eq!(client.site_key, "site-key");
    }

    #[test]
    fn test_solver_failure_converts() {
        let captcha_err = CaptchaError::Exhausted {
            attempts: 3,
            message: "workers busy".to_string(),
        };
        let err = PortalError::from(captcha_err);
        assert!(matches!(err, PortalError::Captcha(_)));
        assert!(!err.is_session_died());
    }
}
