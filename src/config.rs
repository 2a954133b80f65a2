//! Run configuration

use std::time::Duration;

use crate::engine::MethodTimer;

/// Configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// How often the result poller samples pending results when no completion signal wakes it earlier.
    pub poll_interval: Duration,
    /// Tolerance applied to methods with no configured timeout. `0` means unlimited.
    pub default_tolerance_ms: u64,
    /// Settle still-running methods as timeouts once their tolerance has elapsed, aborting async bodies.
    pub watchdog: bool,
    /// Report phase boundaries and per-phase summaries.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            default_tolerance_ms: MethodTimer::DEFAULT_TOLERANCE_MS,
            watchdog: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polling interval. A zero interval is clamped to one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the tolerance used when a method has no timeout entry
    pub fn with_default_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.default_tolerance_ms = tolerance_ms;
        self
    }

    /// Enable or disable the active deadline check
    pub fn with_watchdog(mut self, watchdog: bool) -> Self {
        self.watchdog = watchdog;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
