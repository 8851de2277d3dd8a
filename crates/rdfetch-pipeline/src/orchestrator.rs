//! Lookup orchestrator for driving identifiers through both portals.
//!
//! This module provides the `LookupOrchestrator`, which owns the run's
//! retry machinery: per-identifier session recovery, the cross-identifier
//! stall watchdog, and the outer convergence loop that keeps resubmitting
//! legacy-site timeouts until a pass comes back clean.

use crate::error::Result;
use crate::watchdog::StallWatchdog;
use rdfetch_core::types::{CrashDate, RdNumber, RdRange};
use rdfetch_ledger::{Classification, LedgerCounts, ResultLedger};
use rdfetch_portal::{CaptureOutcome, LookupOutcome, RecordCapture, RecordSearch};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Timing and budget knobs for the orchestrator's retry machinery.
///
/// Production values are minutes long; tests inject near-zero ones.
#[derive(Debug, Clone)]
pub struct PipelineTiming {
    /// Session-recovery retries allowed per identifier per pass. The first
    /// session is free; one more death than this abandons the identifier.
    pub session_attempt_budget: u32,
    /// Wait before re-attempting an identifier whose session died.
    pub session_retry_backoff: Duration,
    /// Silence span after which the watchdog declares a stall.
    pub stall_threshold: Duration,
    /// Pause after each captured record, respecting the legacy site's load
    /// tolerance.
    pub capture_pacing: Duration,
    /// Cap on outer passes; `None` runs until convergence.
    pub max_passes: Option<u32>,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            session_attempt_budget: 3,
            session_retry_backoff: Duration::from_secs(10),
            stall_threshold: Duration::from_secs(180),
            capture_pacing: Duration::from_secs(30),
            max_passes: None,
        }
    }
}

/// End-of-run summary.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Outer passes executed.
    pub passes: u32,
    /// Whether the final pass produced zero legacy-site timeouts.
    pub converged: bool,
    /// Final ledger counts.
    pub counts: LedgerCounts,
    /// Identifiers that finished the run without any classification.
    pub unclassified: Vec<RdNumber>,
    /// Rendered artifacts written during the run.
    pub artifacts: usize,
}

/// Result of one new-site pass.
struct SearchPassResult {
    found: Vec<RdNumber>,
    timed_out: Vec<RdNumber>,
}

/// Result of one legacy-site pass.
struct CapturePassResult {
    timed_out: Vec<RdNumber>,
    artifacts: usize,
}

/// Orchestrates lookup runs across the two portals.
pub struct LookupOrchestrator {
    search: Arc<dyn RecordSearch>,
    capture: Arc<dyn RecordCapture>,
    ledger: ResultLedger,
    timing: PipelineTiming,
    watchdog: StallWatchdog,
}

impl LookupOrchestrator {
    /// Create a new orchestrator over the given portal clients and ledger.
    #[must_use]
    pub fn new(
        search: Arc<dyn RecordSearch>,
        capture: Arc<dyn RecordCapture>,
        ledger: ResultLedger,
        timing: PipelineTiming,
    ) -> Self {
        let watchdog = StallWatchdog::new(timing.stall_threshold);
        Self {
            search,
            capture,
            ledger,
            timing,
            watchdog,
        }
    }

    /// Run the full lookup over `range` until convergence or the pass cap.
    ///
    /// Each outer pass searches the whole range on the new site, then
    /// submits every identifier that was found or timed out to the legacy
    /// site. The run converges when a legacy-site pass yields no timeouts.
    ///
    /// # Errors
    /// Returns error only if the ledger cannot be written; portal failures
    /// are absorbed into classifications and logged skips.
    pub async fn run(&mut self, range: &RdRange, date: &CrashDate) -> Result<RunReport> {
        tracing::info!(
            prefix = range.prefix(),
            identifiers = range.count(),
            date = %date,
            "starting lookup run"
        );

        let mut passes = 0u32;
        let mut converged = false;
        let mut artifacts = 0usize;

        loop {
            passes += 1;
            tracing::info!(pass = passes, "starting new-site pass");
            let searched = self.new_site_pass(range, date).await?;

            // Timed-out identifiers may still have a record behind them, so
            // they join the confirmed ones for the legacy-site pass
            let mut queue = searched.found;
            queue.extend(searched.timed_out);

            tracing::info!(pass = passes, queued = queue.len(), "starting legacy-site pass");
            let captured = self.old_site_pass(&queue, date).await?;
            artifacts += captured.artifacts;

            if captured.timed_out.is_empty() {
                converged = true;
                break;
            }
            tracing::warn!(
                pass = passes,
                remaining = captured.timed_out.len(),
                "legacy-site timeouts remain, scheduling another pass"
            );
            if let Some(max) = self.timing.max_passes {
                if passes >= max {
                    tracing::warn!(passes, "pass budget exhausted before convergence");
                    break;
                }
            }
        }

        let unclassified: Vec<RdNumber> = range
            .iter()
            .filter(|rd| self.ledger.classification_of(rd).is_none())
            .collect();
        for rd in &unclassified {
            tracing::warn!(%rd, "identifier finished the run unclassified");
        }

        let counts = self.ledger.counts();
        tracing::info!(
            passes,
            successful = counts.successful,
            unsuccessful = counts.unsuccessful,
            timed_out = counts.timed_out,
            unclassified = unclassified.len(),
            artifacts,
            converged,
            "lookup run complete"
        );

        Ok(RunReport {
            passes,
            converged,
            counts,
            unclassified,
            artifacts,
        })
    }

    /// Search every identifier in the range on the new site.
    async fn new_site_pass(
        &mut self,
        range: &RdRange,
        date: &CrashDate,
    ) -> Result<SearchPassResult> {
        let mut found = Vec::new();
        let mut timed_out = Vec::new();

        for rd in range.iter() {
            match self.search_identifier(&rd, date).await? {
                Some(LookupOutcome::Found) => found.push(rd),
                Some(LookupOutcome::TimedOut) => timed_out.push(rd),
                Some(LookupOutcome::NotFound) | None => {}
            }
        }

        Ok(SearchPassResult { found, timed_out })
    }

    /// Capture every queued identifier from the legacy site.
    async fn old_site_pass(
        &mut self,
        queue: &[RdNumber],
        date: &CrashDate,
    ) -> Result<CapturePassResult> {
        let mut timed_out = Vec::new();
        let mut artifacts = 0usize;

        for rd in queue {
            match self.capture_identifier(rd, date).await? {
                Some(CaptureOutcome::Captured { artifact }) => {
                    if artifact.is_some() {
                        artifacts += 1;
                    }
                    sleep(self.timing.capture_pacing).await;
                }
                Some(CaptureOutcome::TimedOut) => timed_out.push(rd.clone()),
                None => {}
            }
        }

        Ok(CapturePassResult {
            timed_out,
            artifacts,
        })
    }

    /// One identifier through the new site, with session recovery.
    ///
    /// `None` means the identifier was abandoned unclassified for this pass.
    async fn search_identifier(
        &mut self,
        rd: &RdNumber,
        date: &CrashDate,
    ) -> Result<Option<LookupOutcome>> {
        let mut session_deaths = 0u32;
        loop {
            match self.search.search(rd, date).await {
                Ok(outcome) => {
                    let classification = match outcome {
                        LookupOutcome::Found => Classification::Successful,
                        LookupOutcome::NotFound => Classification::Unsuccessful,
                        LookupOutcome::TimedOut => Classification::TimedOut,
                    };
                    self.classify(rd, classification)?;
                    return Ok(Some(outcome));
                }
                Err(err) if err.is_session_died() => {
                    session_deaths += 1;
                    if let Some(abandoned) = self.handle_session_death(rd, session_deaths, &err) {
                        return Ok(abandoned);
                    }
                    sleep(self.timing.session_retry_backoff).await;
                }
                Err(err) if err.is_timeout() => {
                    tracing::warn!(%rd, "browser-level timeout during search: {err}");
                    self.classify(rd, Classification::TimedOut)?;
                    return Ok(Some(LookupOutcome::TimedOut));
                }
                Err(err) => {
                    tracing::warn!(%rd, "search failed, identifier left unclassified: {err}");
                    return Ok(None);
                }
            }
        }
    }

    /// One identifier through the legacy site, with session recovery.
    async fn capture_identifier(
        &mut self,
        rd: &RdNumber,
        date: &CrashDate,
    ) -> Result<Option<CaptureOutcome>> {
        let mut session_deaths = 0u32;
        loop {
            match self.capture.capture(rd, date).await {
                Ok(outcome) => {
                    let classification = match outcome {
                        CaptureOutcome::Captured { .. } => Classification::Successful,
                        CaptureOutcome::TimedOut => Classification::TimedOut,
                    };
                    self.classify(rd, classification)?;
                    return Ok(Some(outcome));
                }
                Err(err) if err.is_session_died() => {
                    session_deaths += 1;
                    if let Some(abandoned) = self.handle_session_death(rd, session_deaths, &err) {
                        return Ok(abandoned);
                    }
                    sleep(self.timing.session_retry_backoff).await;
                }
                Err(err) if err.is_timeout() => {
                    tracing::warn!(%rd, "browser-level timeout during capture: {err}");
                    self.classify(rd, Classification::TimedOut)?;
                    return Ok(Some(CaptureOutcome::TimedOut));
                }
                Err(err) => {
                    tracing::warn!(%rd, "capture failed, identifier left unclassified: {err}");
                    return Ok(None);
                }
            }
        }
    }

    /// Record a classification and mark watchdog progress.
    ///
    /// Re-recording the same classification is a no-op in the ledger, so an
    /// identifier that needed several sessions still counts once.
    fn classify(&mut self, rd: &RdNumber, classification: Classification) -> Result<()> {
        let changed = self.ledger.record(rd, classification)?;
        self.watchdog.mark_progress();
        if changed {
            tracing::info!(%rd, %classification, "identifier classified");
        }
        Ok(())
    }

    /// Decide whether a dead session warrants another attempt.
    ///
    /// Returns `Some(None)` when the identifier must be abandoned for this
    /// pass, either because its retry budget ran out or because the
    /// watchdog saw no progress for too long. `session_deaths` counts
    /// consecutive deaths; the budget bounds the retries granted after
    /// them, so one more death than the budget abandons.
    fn handle_session_death<T>(
        &mut self,
        rd: &RdNumber,
        session_deaths: u32,
        err: &rdfetch_portal::PortalError,
    ) -> Option<Option<T>> {
        if session_deaths > self.timing.session_attempt_budget {
            tracing::warn!(
                %rd,
                deaths = session_deaths,
                "abandoning identifier after repeated session deaths"
            );
            return Some(None);
        }
        if self.watchdog.is_stalled() {
            tracing::warn!(
                %rd,
                idle = ?self.watchdog.idle_for(),
                "no classification progress for too long, abandoning identifier"
            );
            self.watchdog.mark_progress();
            return Some(None);
        }
        tracing::warn!(
            %rd,
            retry = session_deaths,
            budget = self.timing.session_attempt_budget,
            "session died, retrying identifier on a fresh session: {err}"
        );
        None
    }
}
