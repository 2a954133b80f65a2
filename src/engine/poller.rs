//! Result poller: reports outcomes as they become available, in strict per-suite order.
//!
//! ## Ordering
//!
//! Suites are visited in registration order. Within a suite, entries are reported front to back, and the first
//! entry without an outcome blocks the rest of that suite until a later tick. A blocked suite never blocks the
//! others. A suite's name is reported on its first visit, even if it has nothing to report in this phase.

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use super::executor::{PendingResult, PhaseResults};
use crate::case::Phase;
use crate::report::{PhaseSummary, Reporter};

struct SuiteProgress {
    name: String,
    pending: VecDeque<PendingResult>,
    announced: bool,
}

/// Drains one phase's pending results into a [`Reporter`].
pub struct ResultPoller<'r> {
    reporter: &'r mut dyn Reporter,
    interval: Duration,
    wake: Option<Rc<Notify>>,
}

impl<'r> ResultPoller<'r> {
    pub fn new(reporter: &'r mut dyn Reporter, interval: Duration) -> Self {
        Self {
            reporter,
            interval: interval.max(Duration::from_millis(1)),
            wake: None,
        }
    }

    /// Also sweep whenever `wake` is notified, instead of only on the interval.
    pub fn with_wake_signal(mut self, wake: Rc<Notify>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Report every result of `results`, returning once all suites have drained.
    ///
    /// Never returns while some method of the phase has not completed.
    #[tracing::instrument(skip_all, fields(phase = %phase, suites = results.len()))]
    pub async fn await_results(&mut self, phase: Phase, results: PhaseResults) -> PhaseSummary {
        let started = Instant::now();
        let mut summary = PhaseSummary::default();
        let mut remaining: Vec<SuiteProgress> = results
            .into_iter()
            .map(|suite| SuiteProgress {
                name: suite.name,
                pending: suite.pending,
                announced: false,
            })
            .collect();

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.sweep(&mut remaining, &mut summary);
            if remaining.is_empty() {
                break;
            }
            match &self.wake {
                Some(wake) => {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        () = wake.notified() => {}
                    }
                }
                None => {
                    ticker.tick().await;
                }
            }
        }

        summary.duration = started.elapsed();
        tracing::debug!(
            passed = summary.passed,
            failed = summary.failed,
            elapsed_ms = summary.duration.as_millis() as u64,
            "phase drained"
        );
        self.reporter.on_phase_complete(phase, &summary);
        summary
    }

    /// One pass over every remaining suite. Drained suites are dropped.
    fn sweep(&mut self, remaining: &mut Vec<SuiteProgress>, summary: &mut PhaseSummary) {
        remaining.retain_mut(|suite| {
            if !suite.announced {
                self.reporter.on_suite_start(&suite.name);
                suite.announced = true;
            }
            while let Some(front) = suite.pending.front() {
                let Some(outcome) = front.accessor.try_outcome() else {
                    break;
                };
                self.reporter.on_outcome(&front.method, &outcome);
                summary.record(&outcome);
                suite.pending.pop_front();
            }
            !suite.pending.is_empty()
        });
    }
}
