//! Tester: executes exactly one method under timing and exception-expectation control
//!
//! ## Lifecycle
//!
//! 1. [`Tester::configure_timer`] / [`Tester::declare_expected_exception`] before execution.
//! 2. [`Tester::wrap`] yields a [`Proxy`]; [`Proxy::invoke`] runs the method (inline for synchronous bodies,
//!    spawned on the current `LocalSet` for asynchronous ones).
//! 3. [`Tester::result_accessor`] yields a [`ResultAccessor`] whose `try_outcome` returns `None` until the method
//!    has completed, then the same memoized outcome on every call.
//!
//! Completion is tracked as `NotStarted -> Running -> Completed` and reaches `Completed` exactly once. An
//! unmatched throw is recorded as a failure as soon as it happens; the timing rules are only applied when the
//! outcome is first read.

use std::cell::{OnceCell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use tokio::sync::Notify;
use tokio::task::AbortHandle;

use super::outcome::{Failure, TestOutcome};
use super::timer::MethodTimer;
use crate::case::{ExpectedException, Method, MethodResult, Thrown};

/// What the proxy recorded when the method finished.
#[derive(Debug)]
struct Recorded {
    pass: bool,
    /// A thrown value matched the expected-exception declaration.
    handled: bool,
    error: Option<Failure>,
}

#[derive(Debug)]
enum Completion {
    NotStarted,
    Running,
    Completed(Recorded),
}

#[derive(Debug)]
struct TesterState {
    timer: RefCell<MethodTimer>,
    expected: RefCell<Option<ExpectedException>>,
    completion: RefCell<Completion>,
    outcome: OnceCell<Rc<TestOutcome>>,
    abort: RefCell<Option<AbortHandle>>,
    signal: Option<Rc<Notify>>,
}

impl TesterState {
    fn begin(&self) -> bool {
        let mut completion = self.completion.borrow_mut();
        if !matches!(*completion, Completion::NotStarted) {
            return false;
        }
        *completion = Completion::Running;
        self.timer.borrow_mut().mark_start(Instant::now());
        true
    }

    /// Record the method's result. Runs on every exit path; ignored once completed.
    fn finish(&self, result: MethodResult) {
        let mut completion = self.completion.borrow_mut();
        if matches!(*completion, Completion::Completed(_)) {
            return;
        }
        self.timer.borrow_mut().mark_end(Instant::now());

        let recorded = match result {
            Ok(()) => Recorded {
                pass: true,
                handled: false,
                error: None,
            },
            Err(thrown) => {
                let matched = self
                    .expected
                    .borrow()
                    .as_ref()
                    .is_some_and(|expected| expected.matches(&thrown));
                if matched {
                    Recorded {
                        pass: true,
                        handled: true,
                        error: None,
                    }
                } else {
                    Recorded {
                        pass: false,
                        handled: false,
                        error: Some(Failure::from_thrown(thrown)),
                    }
                }
            }
        };
        *completion = Completion::Completed(recorded);
        drop(completion);

        if let Some(signal) = &self.signal {
            signal.notify_one();
        }
    }
}

/// Wraps a single test method.
#[derive(Debug)]
pub struct Tester {
    state: Rc<TesterState>,
    watchdog: bool,
}

impl Default for Tester {
    fn default() -> Self {
        Self::new()
    }
}

impl Tester {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A tester that notifies `signal` once its method completes.
    pub fn with_signal(signal: Rc<Notify>) -> Self {
        Self::build(Some(signal))
    }

    fn build(signal: Option<Rc<Notify>>) -> Self {
        Self {
            state: Rc::new(TesterState {
                timer: RefCell::new(MethodTimer::default()),
                expected: RefCell::new(None),
                completion: RefCell::new(Completion::NotStarted),
                outcome: OnceCell::new(),
                abort: RefCell::new(None),
                signal,
            }),
            watchdog: false,
        }
    }

    /// Let the accessor settle a still-running method as a timeout once its tolerance has passed.
    pub fn with_watchdog(mut self, watchdog: bool) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Install the timer for this invocation, or the default `{ tolerance_ms: 1000 }`.
    pub fn configure_timer(&self, timer: Option<MethodTimer>) {
        *self.state.timer.borrow_mut() = timer.map_or_else(MethodTimer::default, |t| t.fresh());
    }

    /// Record that the method is expected to throw.
    pub fn declare_expected_exception(&self, expected: ExpectedException) {
        *self.state.expected.borrow_mut() = Some(expected);
    }

    pub fn wrap(&self, method: Method) -> Proxy {
        Proxy {
            state: Rc::clone(&self.state),
            method,
        }
    }

    pub fn result_accessor(&self) -> ResultAccessor {
        ResultAccessor {
            state: Rc::clone(&self.state),
            watchdog: self.watchdog,
        }
    }
}

/// Invocable proxy produced by [`Tester::wrap`].
pub struct Proxy {
    state: Rc<TesterState>,
    method: Method,
}

impl Proxy {
    /// Run the wrapped method.
    ///
    /// Synchronous bodies run to completion before this returns; panics are caught and recorded. Asynchronous
    /// bodies are spawned as local tasks and complete later.
    ///
    /// ## Panics
    ///
    /// Asynchronous methods must be invoked from within a `tokio::task::LocalSet`.
    pub fn invoke(self) {
        if !self.state.begin() {
            tracing::warn!("tester proxy invoked more than once; ignoring");
            return;
        }
        match self.method {
            Method::Sync(body) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| body(&[])))
                    .unwrap_or_else(|payload| Err(Thrown::from_panic(payload)));
                self.state.finish(result);
            }
            Method::Async(body) => {
                let task = tokio::task::spawn_local(body(Vec::new()));
                *self.state.abort.borrow_mut() = Some(task.abort_handle());
                let state = self.state;
                tokio::task::spawn_local(async move {
                    let result = match task.await {
                        Ok(result) => result,
                        Err(err) if err.is_panic() => Err(Thrown::from_panic(err.into_panic())),
                        Err(_) => Err(Thrown::Panic("task cancelled".to_string())),
                    };
                    state.finish(result);
                });
            }
        }
    }
}

/// Non-blocking, idempotent view of a tester's outcome.
#[derive(Debug, Clone)]
pub struct ResultAccessor {
    state: Rc<TesterState>,
    watchdog: bool,
}

impl ResultAccessor {
    /// `None` while the method has not completed; afterwards the same outcome on every call.
    pub fn try_outcome(&self) -> Option<Rc<TestOutcome>> {
        if let Some(outcome) = self.state.outcome.get() {
            return Some(Rc::clone(outcome));
        }

        let settled = {
            let mut completion = self.state.completion.borrow_mut();
            match &mut *completion {
                Completion::Completed(recorded) => Some(self.settle(recorded)),
                Completion::Running if self.watchdog => self.deadline_passed(),
                _ => None,
            }
        }?;

        Some(Rc::clone(self.state.outcome.get_or_init(|| Rc::new(settled))))
    }

    pub fn is_complete(&self) -> bool {
        self.state.outcome.get().is_some() || matches!(*self.state.completion.borrow(), Completion::Completed(_))
    }

    /// Apply the timing and expectation rules to a completed invocation.
    fn settle(&self, recorded: &mut Recorded) -> TestOutcome {
        let timer = *self.state.timer.borrow();
        let total_time = timer.elapsed();

        if let Some(elapsed) = total_time.filter(|elapsed| timer.exceeded(*elapsed)) {
            return TestOutcome::failed(
                Failure::TimeoutExceeded {
                    tolerance_ms: timer.tolerance_ms(),
                    elapsed,
                },
                total_time,
            );
        }

        if recorded.pass && !recorded.handled {
            if let Some(expected) = self.state.expected.borrow().as_ref() {
                return TestOutcome::failed(
                    Failure::ExpectedExceptionNotThrown {
                        expected: expected.identifier().to_string(),
                    },
                    total_time,
                );
            }
        }

        TestOutcome {
            pass: recorded.pass,
            error: recorded.error.take(),
            total_time,
        }
    }

    /// Watchdog check for a running method: settle it as a timeout once its tolerance has elapsed.
    fn deadline_passed(&self) -> Option<TestOutcome> {
        let mut timer = self.state.timer.borrow_mut();
        let elapsed = timer.start()?.elapsed();
        if !timer.exceeded(elapsed) {
            return None;
        }
        timer.mark_end(Instant::now());
        let tolerance_ms = timer.tolerance_ms();
        drop(timer);

        if let Some(abort) = self.state.abort.borrow_mut().take() {
            abort.abort();
        }
        tracing::warn!(tolerance_ms, "method still running past its tolerance; settling as timeout");
        Some(TestOutcome::failed(
            Failure::TimeoutExceeded { tolerance_ms, elapsed },
            Some(elapsed),
        ))
    }
}
