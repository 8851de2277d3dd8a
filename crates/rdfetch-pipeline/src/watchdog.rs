//! Stall detection across identifiers.

use std::time::{Duration, Instant};

/// Coarse circuit breaker against silently hung sessions.
///
/// Progress means an identifier reached a terminal classification. When no
/// identifier has for longer than the threshold, the orchestrator abandons
/// whatever it is retrying and moves on to the next identifier.
#[derive(Debug)]
pub struct StallWatchdog {
    last_progress: Instant,
    threshold: Duration,
}

impl StallWatchdog {
    /// Create a watchdog that trips after `threshold` without progress.
    #[must_use]
    pub fn new(threshold: Duration) -> Self {
        Self {
            last_progress: Instant::now(),
            threshold,
        }
    }

    /// Record progress, re-arming the watchdog.
    pub fn mark_progress(&mut self) {
        self.last_progress = Instant::now();
    }

    /// Whether the threshold has elapsed since the last progress.
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.last_progress.elapsed() >= self.threshold
    }

    /// Time since the last recorded progress.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_progress.elapsed()
    }
}
