//! Run surface
//!
//! [`Harness`] ties the pieces together: it loads definitions, registers them, runs the setup phase and waits for
//! every setup result, then runs the test phase and waits again.
//!
//! ## Notes
//!
//! - Methods run cooperatively on one thread. [`Harness::run`] must be awaited inside a `tokio::task::LocalSet`;
//!   [`Harness::run_blocking`] builds the runtime and local set itself.
//! - Run-level failures (unreadable definitions, unknown case paths, unresolvable parameters) abort before any
//!   method executes. Per-method failures are reported and counted, never returned as errors.

use std::time::Instant;

use tokio::task::LocalSet;

use crate::case::Phase;
use crate::config::RunConfig;
use crate::definition::{CaseCatalog, DefinitionSource, load_definitions};
use crate::engine::{Executor, ResultPoller, SuiteRegistry};
use crate::error::{HarnessError, HarnessResult};
use crate::inject::{Injector, Interceptor, MethodInterceptor, ValueInjector};
use crate::report::{ConsoleReporter, PhaseSummary, Reporter, RunReport};

/// Entry point for a two-phase run.
pub struct Harness {
    config: RunConfig,
    catalog: CaseCatalog,
    injector: Box<dyn Injector>,
    interceptor: Box<dyn Interceptor>,
    reporter: Box<dyn Reporter>,
}

impl Harness {
    /// A harness reporting to stdout with the default injector and interceptor.
    pub fn new(config: RunConfig, catalog: CaseCatalog) -> Self {
        let verbose = config.verbose;
        Self {
            config,
            catalog,
            injector: Box::new(ValueInjector::new()),
            interceptor: Box::new(MethodInterceptor),
            reporter: Box::new(ConsoleReporter::stdout(verbose)),
        }
    }

    pub fn with_injector(mut self, injector: impl Injector + 'static) -> Self {
        self.injector = Box::new(injector);
        self
    }

    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptor = Box::new(interceptor);
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every source through both phases and report the total run time.
    ///
    /// ## Errors
    ///
    /// Returns a [`HarnessError`] when definitions cannot be loaded or registered. No method runs in that case.
    ///
    /// ## Panics
    ///
    /// Asynchronous methods are spawned with `spawn_local`, so this must be awaited inside a `LocalSet`.
    #[tracing::instrument(skip_all, fields(source_count = sources.len()))]
    pub async fn run(mut self, sources: Vec<DefinitionSource>) -> HarnessResult<RunReport> {
        let started_at = Instant::now();

        let definitions = load_definitions(sources, &self.catalog)?;
        let registry = SuiteRegistry::with_collaborators(self.injector, self.interceptor);
        let mut executor = Executor::with_registry(registry, self.config.clone());
        executor.add_test_definitions(definitions)?;
        tracing::info!(suites = executor.registry().suites().len(), "starting run");

        let setup = run_phase(&executor, &mut *self.reporter, &self.config, Phase::Setup).await;
        let test = run_phase(&executor, &mut *self.reporter, &self.config, Phase::Test).await;

        let report = RunReport {
            started_at,
            finished_at: Instant::now(),
            setup,
            test,
        };
        self.reporter.on_run_complete(&report);
        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            elapsed_ms = report.elapsed().as_millis() as u64,
            "run complete"
        );
        Ok(report)
    }

    /// Run on a fresh current-thread runtime, blocking until both phases have drained.
    ///
    /// ## Errors
    ///
    /// Everything [`Harness::run`] returns, plus [`HarnessError::Runtime`] if the runtime cannot be built.
    pub fn run_blocking(self, sources: Vec<DefinitionSource>) -> HarnessResult<RunReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(HarnessError::Runtime)?;
        let local = LocalSet::new();
        local.block_on(&runtime, self.run(sources))
    }
}

/// Submit every method of `phase`, then wait for all of them and report them.
async fn run_phase(
    executor: &Executor,
    reporter: &mut dyn Reporter,
    config: &RunConfig,
    phase: Phase,
) -> PhaseSummary {
    reporter.on_phase_start(phase);
    let results = executor.run(phase);
    ResultPoller::new(reporter, config.poll_interval)
        .with_wake_signal(executor.completion_signal())
        .await_results(phase, results)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{Method, TestCase};
    use crate::definition::{TestCaseDefinition, TestMetadata};
    use crate::engine::TestOutcome;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<String>>>);

    impl Reporter for Shared {
        fn on_suite_start(&mut self, suite: &str) {
            self.0.borrow_mut().push(format!("suite {suite}"));
        }

        fn on_outcome(&mut self, method: &str, outcome: &TestOutcome) {
            self.0.borrow_mut().push(format!("{method} {}", outcome.pass));
        }

        fn on_run_complete(&mut self, _report: &RunReport) {
            self.0.borrow_mut().push("done".to_string());
        }
    }

    fn fast_config() -> RunConfig {
        RunConfig::default().with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_run_blocking_reports_both_phases() {
        let events = Shared::default();
        let case = TestCase::new()
            .method("testA", Method::new(|| Ok(())))
            .method("setupA", Method::new(|| Ok(())));
        let report = Harness::new(fast_config(), CaseCatalog::new())
            .with_reporter(events.clone())
            .run_blocking(vec![TestCaseDefinition::new("a", case, TestMetadata::new()).into()])
            .unwrap();

        assert!(report.success());
        assert_eq!((report.setup.total, report.test.total), (1, 1));
        assert!(report.finished_at >= report.started_at);
        assert_eq!(
            *events.0.borrow(),
            ["suite default", "a.setupA true", "suite default", "a.testA true", "done"]
        );
    }

    #[test]
    fn test_unknown_reference_aborts_before_running() {
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        let case = TestCase::new().method(
            "testA",
            Method::with_params(move |_| {
                *flag.borrow_mut() = true;
                Ok(())
            }),
        );
        let metadata =
            TestMetadata::new().with_injected("testA", vec![crate::definition::ParamSpec::reference("missing")]);
        let err = Harness::new(fast_config(), CaseCatalog::new())
            .with_reporter(Shared::default())
            .run_blocking(vec![TestCaseDefinition::new("a", case, metadata).into()])
            .unwrap_err();

        assert!(matches!(err, HarnessError::Inject { .. }));
        assert!(!*ran.borrow());
    }

    #[test]
    fn test_injector_is_used() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let case = TestCase::new().method(
            "testConn",
            Method::with_params(move |params| {
                sink.borrow_mut().extend_from_slice(params);
                Ok(())
            }),
        );
        let metadata =
            TestMetadata::new().with_injected("testConn", vec![crate::definition::ParamSpec::reference("dsn")]);
        Harness::new(fast_config(), CaseCatalog::new())
            .with_injector(ValueInjector::new().provide("dsn", "postgres://localhost"))
            .with_reporter(Shared::default())
            .run_blocking(vec![TestCaseDefinition::new("c", case, metadata).into()])
            .unwrap();
        assert_eq!(*seen.borrow(), [serde_json::Value::from("postgres://localhost")]);
    }
}
