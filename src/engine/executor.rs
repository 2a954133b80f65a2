//! Executor: one execution pass over every registered suite.

use std::collections::VecDeque;
use std::rc::Rc;

use tokio::sync::Notify;

use super::registry::SuiteRegistry;
use super::tester::{ResultAccessor, Tester};
use super::timer::MethodTimer;
use crate::case::{ExpectedException, Phase};
use crate::config::RunConfig;
use crate::definition::{TestCaseDefinition, parse_timeouts};
use crate::error::HarnessResult;

/// A submitted method invocation whose outcome may not be available yet.
#[derive(Debug, Clone)]
pub struct PendingResult {
    /// `<path>.<method>`
    pub method: String,
    pub accessor: ResultAccessor,
}

/// Pending results of one suite, in registration order.
#[derive(Debug, Clone)]
pub struct SuiteResults {
    pub name: String,
    pub pending: VecDeque<PendingResult>,
}

/// Everything one pass submitted, keyed by suite.
pub type PhaseResults = Vec<SuiteResults>;

/// Drives suites through the setup and test phases.
pub struct Executor {
    registry: SuiteRegistry,
    config: RunConfig,
    completion: Rc<Notify>,
}

impl Executor {
    pub fn new(config: RunConfig) -> Self {
        Self::with_registry(SuiteRegistry::new(), config)
    }

    pub fn with_registry(registry: SuiteRegistry, config: RunConfig) -> Self {
        Self {
            registry,
            config,
            completion: Rc::new(Notify::new()),
        }
    }

    pub fn registry(&self) -> &SuiteRegistry {
        &self.registry
    }

    /// Notified whenever a method submitted by this executor completes.
    pub fn completion_signal(&self) -> Rc<Notify> {
        Rc::clone(&self.completion)
    }

    /// Register every definition, building its timers from the raw timeout metadata.
    ///
    /// ## Errors
    ///
    /// Stops at the first definition whose parameters cannot be injected.
    pub fn add_test_definitions(&mut self, definitions: Vec<TestCaseDefinition>) -> HarnessResult<&mut Self> {
        for definition in definitions {
            let timers = parse_timeouts(&definition.metadata.timeout);
            let mut case = definition.test_case;
            for (method, literal) in &definition.metadata.expect_exceptions {
                case = case.expecting(method, ExpectedException::literal(literal.clone()));
            }
            self.registry.add_case(&definition.metadata, &definition.path, case, timers)?;
        }
        Ok(self)
    }

    /// Invoke every method of `phase` across all suites.
    pub fn run(&self, phase: Phase) -> PhaseResults {
        self.run_prefix(phase.prefix())
    }

    /// Invoke every method whose name starts with `prefix` (case-sensitive) across all suites.
    ///
    /// Returns as soon as every invocation has been submitted; asynchronous methods may still be running.
    #[tracing::instrument(skip(self), fields(suite_count = self.registry.suites().len()))]
    pub fn run_prefix(&self, prefix: &str) -> PhaseResults {
        let default_timer = MethodTimer::with_tolerance_ms(self.config.default_tolerance_ms);
        let mut results = PhaseResults::new();

        for suite in self.registry.suites() {
            let mut pending = VecDeque::new();
            for entry in &suite.entries {
                for case_method in entry.case.methods_with_prefix(prefix) {
                    let tester = Tester::with_signal(self.completion_signal()).with_watchdog(self.config.watchdog);
                    let timer = entry.method_timers.get(&case_method.name).copied();
                    tester.configure_timer(Some(timer.unwrap_or(default_timer)));
                    if let Some(expected) = &case_method.expected {
                        tester.declare_expected_exception(expected.clone());
                    }

                    let qualified = format!("{}.{}", entry.path, case_method.name);
                    tracing::trace!(method = %qualified, "invoking");
                    tester.wrap(case_method.method.clone()).invoke();

                    pending.push_back(PendingResult {
                        method: qualified,
                        accessor: tester.result_accessor(),
                    });
                }
            }
            results.push(SuiteResults {
                name: suite.name.clone(),
                pending,
            });
        }

        results
    }
}
