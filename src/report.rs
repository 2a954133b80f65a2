//! Outcome reporting
//!
//! ## Reporter Trait
//!
//! The poller and the harness report through [`Reporter`], separating output from execution. The default
//! [`ConsoleReporter`] writes the line-oriented format:
//!
//! ```text
//! db
//!   Pass   db.users.testInsert (3 ms)
//!   Fail   db.users.testDelete (1 ms)
//!     1 === 2 is not true
//! ===============================================
//! Total Test Run Time: 112ms
//! ```

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::case::Phase;
use crate::engine::TestOutcome;

/// Trait for reporting run progress and outcomes.
pub trait Reporter {
    /// Called before a phase's methods are invoked
    fn on_phase_start(&mut self, _phase: Phase) {}

    /// Called the first time the poller visits a suite in the current phase
    fn on_suite_start(&mut self, suite: &str);

    /// Called once per method, as soon as its outcome is available and every earlier entry of its suite has been
    /// reported
    fn on_outcome(&mut self, method: &str, outcome: &TestOutcome);

    /// Called when every suite of a phase has drained
    fn on_phase_complete(&mut self, _phase: Phase, _summary: &PhaseSummary) {}

    /// Called once, after the test phase
    fn on_run_complete(&mut self, report: &RunReport);
}

/// Counts for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl PhaseSummary {
    pub fn record(&mut self, outcome: &TestOutcome) {
        self.total += 1;
        if outcome.pass {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Result of a whole run, returned by [`crate::Harness::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub started_at: Instant,
    pub finished_at: Instant,
    pub setup: PhaseSummary,
    pub test: PhaseSummary,
}

impl RunReport {
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }

    pub fn passed(&self) -> usize {
        self.setup.passed + self.test.passed
    }

    pub fn failed(&self) -> usize {
        self.setup.failed + self.test.failed
    }

    /// No method failed in either phase.
    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

/// Width of the separator printed before the total run time.
const SEPARATOR_WIDTH: usize = 47;

/// Default line-oriented reporter over any writer.
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbose: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(text).and_then(|()| self.out.write_all(b"\n")) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_phase_start(&mut self, phase: Phase) {
        if self.verbose {
            self.line(format_args!("[{phase}]"));
        }
    }

    fn on_suite_start(&mut self, suite: &str) {
        self.line(format_args!("{suite}"));
    }

    fn on_outcome(&mut self, method: &str, outcome: &TestOutcome) {
        let status = if outcome.pass { "  Pass" } else { "  Fail" };
        self.line(format_args!("{status}   {method} ({} ms)", outcome.total_ms()));
        if let Some(error) = &outcome.error {
            for detail in error.detail().lines() {
                self.line(format_args!("    {detail}"));
            }
        }
    }

    fn on_phase_complete(&mut self, phase: Phase, summary: &PhaseSummary) {
        if self.verbose {
            self.line(format_args!(
                "[{phase}] {} passed, {} failed in {} ms",
                summary.passed,
                summary.failed,
                summary.duration.as_millis()
            ));
        }
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        self.line(format_args!("{}", "=".repeat(SEPARATOR_WIDTH)));
        self.line(format_args!("Total Test Run Time: {}ms", report.elapsed().as_millis()));
        let _ = self.out.flush();
    }
}
