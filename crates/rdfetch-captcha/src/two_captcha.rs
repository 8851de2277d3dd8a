//! 2Captcha-protocol solving client.
//!
//! Speaks the classic `in.php`/`res.php` HTTP API: submit the challenge,
//! then poll until the worker pool produces a token. Every attempt consumes
//! paid quota, so the retry budget is fixed rather than open-ended.

use crate::error::{CaptchaError, Result};
use crate::solver::CaptchaSolver;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Maximum solving attempts per challenge.
const MAX_ATTEMPTS: u32 = 3;

/// Delay between solving attempts.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Interval between solution polls within one attempt.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How long one attempt waits for the worker pool before giving up.
const POLL_BUDGET: Duration = Duration::from_secs(120);

/// Poll answer meaning the worker pool is still solving.
const NOT_READY: &str = "CAPCHA_NOT_READY";

/// The two wire calls of the solving protocol, split from the retry and
/// polling policy so the policy can be exercised against a scripted service.
#[async_trait]
trait ServiceApi: Send + Sync {
    /// Submit a challenge; returns the service-side captcha id to poll.
    async fn submit(&self, site_key: &str, page_url: &str) -> Result<String>;

    /// Poll for a solution. `Ok(None)` means the workers are still busy.
    async fn poll(&self, captcha_id: &str) -> Result<Option<String>>;
}

/// reCAPTCHA solver backed by a 2Captcha-protocol service.
pub struct TwoCaptchaSolver {
    api: Arc<dyn ServiceApi>,
}

impl TwoCaptchaSolver {
    /// Create a new solver against `base_url` (e.g. `http://2captcha.com`).
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api: Arc::new(HttpApi::new(client, api_key.into(), base_url.into())),
        })
    }

    #[cfg(test)]
    fn with_api(api: Arc<dyn ServiceApi>) -> Self {
        Self { api }
    }

    /// One full submit-and-poll cycle.
    async fn solve_once(&self, site_key: &str, page_url: &str) -> Result<String> {
        let captcha_id = self.api.submit(site_key, page_url).await?;
        tracing::debug!(captcha_id = %captcha_id, "challenge submitted, polling for solution");

        let deadline = Instant::now() + POLL_BUDGET;
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            if let Some(token) = self.api.poll(&captcha_id).await? {
                return Ok(token);
            }
            if Instant::now() >= deadline {
                return Err(CaptchaError::Timeout {
                    seconds: POLL_BUDGET.as_secs(),
                });
            }
        }
    }
}

#[async_trait]
impl CaptchaSolver for TwoCaptchaSolver {
    async fn solve(&self, site_key: &str, page_url: &str) -> Result<String> {
        let mut last_error: Option<CaptchaError> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.solve_once(site_key, page_url).await {
                Ok(token) => {
                    tracing::debug!(attempt, "captcha solved");
                    return Ok(token);
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        "captcha solving attempt failed: {err}"
                    );
                    last_error = Some(err);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(CaptchaError::Exhausted {
            attempts: MAX_ATTEMPTS,
            message: last_error.map_or_else(|| "unknown".to_string(), |e| e.to_string()),
        })
    }
}

/// HTTP backend speaking to a live 2Captcha-style endpoint.
struct HttpApi {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpApi {
    fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn parse_answer(response: reqwest::Response) -> Result<ServiceAnswer> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(CaptchaError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ServiceAnswer>()
            .await
            .map_err(|e| CaptchaError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ServiceApi for HttpApi {
    async fn submit(&self, site_key: &str, page_url: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/in.php", self.base_url))
            .form(&[
                ("key", self.api_key.as_str()),
                ("method", "userrecaptcha"),
                ("googlekey", site_key),
                ("pageurl", page_url),
                ("json", "1"),
            ])
            .send()
            .await?;

        let answer = Self::parse_answer(response).await?;
        if answer.status == 1 {
            Ok(answer.request)
        } else {
            Err(CaptchaError::Rejected {
                code: answer.request,
            })
        }
    }

    async fn poll(&self, captcha_id: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/res.php", self.base_url))
            .query(&[
                ("key", self.api_key.as_str()),
                ("action", "get"),
                ("id", captcha_id),
                ("json", "1"),
            ])
            .send()
            .await?;

        let answer = Self::parse_answer(response).await?;
        if answer.status == 1 {
            Ok(Some(answer.request))
        } else if answer.request == NOT_READY {
            Ok(None)
        } else {
            Err(CaptchaError::Rejected {
                code: answer.request,
            })
        }
    }
}

/// Wire shape shared by `in.php` and `res.php` with `json=1`.
#[derive(Debug, Deserialize)]
struct ServiceAnswer {
    status: u8,
    request: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// One scripted wire answer. A script's last step repeats once the
    /// script runs out.
    #[derive(Clone, Copy)]
    enum WireStep {
        Answer(&'static str),
        Rejected(&'static str),
        Pending,
    }

    struct Script {
        steps: Vec<WireStep>,
        next: usize,
    }

    impl Script {
        fn advance(&mut self) -> WireStep {
            let step = self.steps[self.next.min(self.steps.len() - 1)];
            self.next += 1;
            step
        }
    }

    /// Scripted service: plays back submit and poll answers in order.
    struct ScriptedApi {
        submit_steps: Mutex<Script>,
        poll_steps: Mutex<Script>,
        submits: Mutex<Vec<(String, String)>>,
        polls: Mutex<u32>,
    }

    impl ScriptedApi {
        fn new(submit_steps: &[WireStep], poll_steps: &[WireStep]) -> Self {
            Self {
                submit_steps: Mutex::new(Script {
                    steps: submit_steps.to_vec(),
                    next: 0,
                }),
                poll_steps: Mutex::new(Script {
                    steps: poll_steps.to_vec(),
                    next: 0,
                }),
                submits: Mutex::new(Vec::new()),
                polls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ServiceApi for ScriptedApi {
        async fn submit(&self, site_key: &str, page_url: &str) -> Result<String> {
            self.submits
                .lock()
                .unwrap()
                .push((site_key.to_string(), page_url.to_string()));
            match self.submit_steps.lock().unwrap().advance() {
                WireStep::Answer(id) => Ok(id.to_string()),
                WireStep::Rejected(code) => Err(CaptchaError::Rejected {
                    code: code.to_string(),
                }),
                WireStep::Pending => panic!("pending is a poll-side step"),
            }
        }

        async fn poll(&self, _captcha_id: &str) -> Result<Option<String>> {
            *self.polls.lock().unwrap() += 1;
            match self.poll_steps.lock().unwrap().advance() {
                WireStep::Answer(token) => Ok(Some(token.to_string())),
                WireStep::Pending => Ok(None),
                WireStep::Rejected(code) => Err(CaptchaError::Rejected {
                    code: code.to_string(),
                }),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_attempts_retry_until_token() {
        let api = Arc::new(ScriptedApi::new(
            &[
                WireStep::Rejected("ERROR_NO_SLOT_AVAILABLE"),
                WireStep::Rejected("ERROR_NO_SLOT_AVAILABLE"),
                WireStep::Answer("2122988149"),
            ],
            &[WireStep::Answer("03AGdBq25SxZT")],
        ));
        let solver = TwoCaptchaSolver::with_api(api.clone());

        let token = solver
            .solve("site-key", "https://portal.example.gov/search")
            .await
            .expect("token");

        assert_eq!(token, "03AGdBq25SxZT");
        let submits = api.submits.lock().unwrap();
        assert_eq!(submits.len(), 3);
        assert!(submits
            .iter()
            .all(|(key, url)| key == "site-key" && url == "https://portal.example.gov/search"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_carries_last_failure() {
        let api = Arc::new(ScriptedApi::new(
            &[
                WireStep::Rejected("ERROR_NO_SLOT_AVAILABLE"),
                WireStep::Rejected("ERROR_NO_SLOT_AVAILABLE"),
                WireStep::Rejected("ERROR_ZERO_BALANCE"),
            ],
            &[WireStep::Pending],
        ));
        let solver = TwoCaptchaSolver::with_api(api.clone());

        let err = solver
            .solve("site-key", "https://portal.example.gov/search")
            .await
            .expect_err("exhausted");

        match err {
            CaptchaError::Exhausted { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("ERROR_ZERO_BALANCE"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.submits.lock().unwrap().len(), 3);
        // Rejected submissions never reach the polling stage
        assert_eq!(*api.polls.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_workers_polled_until_ready() {
        let api = Arc::new(ScriptedApi::new(
            &[WireStep::Answer("2122988149")],
            &[
                WireStep::Pending,
                WireStep::Pending,
                WireStep::Answer("03AGdBq25SxZT"),
            ],
        ));
        let solver = TwoCaptchaSolver::with_api(api.clone());

        let token = solver
            .solve("site-key", "https://portal.example.gov/search")
            .await
            .expect("token");

        assert_eq!(token, "03AGdBq25SxZT");
        // Waiting on busy workers must not re-spend submission quota
        assert_eq!(api.submits.lock().unwrap().len(), 1);
        assert_eq!(*api.polls.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_polls_stop_at_the_budget() {
        let api = Arc::new(ScriptedApi::new(
            &[WireStep::Answer("2122988149")],
            &[WireStep::Pending],
        ));
        let solver = TwoCaptchaSolver::with_api(api.clone());

        let err = solver
            .solve("site-key", "https://portal.example.gov/search")
            .await
            .expect_err("exhausted");

        match err {
            CaptchaError::Exhausted { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("not ready after 120s"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.submits.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_retry_constants() {
        // Changing these shifts cost and latency per identifier
        assert_eq!(MAX_ATTEMPTS, 3);
        assert_eq!(RETRY_DELAY, Duration::from_secs(5));
        assert_eq!(POLL_INTERVAL, Duration::from_secs(5));
        assert_eq!(POLL_BUDGET, Duration::from_secs(120));
    }

    #[test]
    fn test_solver_creation() {
        TwoCaptchaSolver::new("test-key", "http://2captcha.com/").expect("create solver");

        let client = Client::builder().build().expect("client");
        let api = HttpApi::new(client, "test-key".to_string(), "http://2captcha.com/".to_string());
        assert_eq!(api.base_url, "http://2captcha.com");
    }

    #[test]
    fn test_answer_parsing() {
        let ok: ServiceAnswer =
            serde_json::from_str(r#"{"status":1,"request":"2122988149"}"#).expect("parse answer");
        assert_eq!(ok.status, 1);
        assert_eq!(ok.request, "2122988149");

        let pending: ServiceAnswer =
            serde_json::from_str(r#"{"status":0,"request":"CAPCHA_NOT_READY"}"#)
                .expect("parse answer");
        assert_eq!(pending.status, 0);
        assert_eq!(pending.request, NOT_READY);
    }
}
