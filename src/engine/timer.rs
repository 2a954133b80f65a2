//! Per-invocation method timer

use std::time::{Duration, Instant};

/// Start/end timestamps of one method invocation plus its tolerance.
///
/// A tolerance of `0` means unlimited. Timers are never shared: the executor copies the configured template
/// into a fresh timer for every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodTimer {
    start: Option<Instant>,
    end: Option<Instant>,
    tolerance_ms: u64,
}

impl Default for MethodTimer {
    fn default() -> Self {
        Self::with_tolerance_ms(Self::DEFAULT_TOLERANCE_MS)
    }
}

impl MethodTimer {
    pub const DEFAULT_TOLERANCE_MS: u64 = 1000;

    pub const fn with_tolerance_ms(tolerance_ms: u64) -> Self {
        Self {
            start: None,
            end: None,
            tolerance_ms,
        }
    }

    pub const fn unlimited() -> Self {
        Self::with_tolerance_ms(0)
    }

    /// Unstarted copy carrying the same tolerance.
    pub const fn fresh(&self) -> Self {
        Self::with_tolerance_ms(self.tolerance_ms)
    }

    pub const fn tolerance_ms(&self) -> u64 {
        self.tolerance_ms
    }

    /// `None` when unlimited.
    pub fn tolerance(&self) -> Option<Duration> {
        (self.tolerance_ms > 0).then(|| Duration::from_millis(self.tolerance_ms))
    }

    pub fn start(&self) -> Option<Instant> {
        self.start
    }

    pub fn end(&self) -> Option<Instant> {
        self.end
    }

    /// Record the start time unless one is already set.
    pub fn mark_start(&mut self, now: Instant) {
        self.start.get_or_insert(now);
    }

    /// Record the end time unless one is already set.
    pub fn mark_end(&mut self, now: Instant) {
        self.end.get_or_insert(now);
    }

    /// `end - start`, once both are recorded.
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }

    /// Whether `elapsed` is over a positive tolerance.
    pub fn exceeded(&self, elapsed: Duration) -> bool {
        self.tolerance().is_some_and(|tolerance| elapsed > tolerance)
    }
}
