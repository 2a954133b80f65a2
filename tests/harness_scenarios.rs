//! End-to-end runs through the public harness surface.
//!
//! Run with: `cargo test --test harness_scenarios`

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use suiterun::engine::{Failure, TestOutcome};
use suiterun::{
    CaseCatalog, ConsoleReporter, ExpectedException, Harness, Method, MethodResult, OperatorId, Reporter, RunConfig,
    RunReport, TestCase, TestCaseDefinition, TestMetadata, Tester, assert_compare,
};

#[derive(Debug, thiserror::Error)]
#[error("index out of range")]
struct RangeError;

/// Outcome summary captured by [`Capture`]: `(qualified name, pass, error text)`.
type Line = (String, bool, Option<String>);

#[derive(Clone, Default)]
struct Capture {
    suites: Rc<RefCell<Vec<String>>>,
    outcomes: Rc<RefCell<Vec<Line>>>,
}

impl Capture {
    fn outcome(&self, method: &str) -> Line {
        self.outcomes
            .borrow()
            .iter()
            .find(|(name, ..)| name == method)
            .cloned()
            .unwrap_or_else(|| panic!("no outcome for {method}"))
    }

    fn names(&self) -> Vec<String> {
        self.outcomes.borrow().iter().map(|(name, ..)| name.clone()).collect()
    }
}

impl Reporter for Capture {
    fn on_suite_start(&mut self, suite: &str) {
        self.suites.borrow_mut().push(suite.to_string());
    }

    fn on_outcome(&mut self, method: &str, outcome: &TestOutcome) {
        let error = outcome.error.as_ref().map(Failure::to_string);
        self.outcomes.borrow_mut().push((method.to_string(), outcome.pass, error));
    }

    fn on_run_complete(&mut self, _report: &RunReport) {}
}

#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn config() -> RunConfig {
    RunConfig::default().with_poll_interval(Duration::from_millis(5))
}

fn run(definitions: Vec<TestCaseDefinition>) -> (RunReport, Capture) {
    let capture = Capture::default();
    let report = Harness::new(config(), CaseCatalog::new())
        .with_reporter(capture.clone())
        .run_blocking(definitions.into_iter().map(Into::into).collect())
        .unwrap();
    (report, capture)
}

fn single(path: &str, case: TestCase, metadata: TestMetadata) -> (RunReport, Capture) {
    run(vec![TestCaseDefinition::new(path, case, metadata)])
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_passing_comparison() {
    let case = TestCase::new().method(
        "testEq",
        Method::new(|| {
            assert_compare(&1, OperatorId::Eq, &1, None)?;
            Ok(())
        }),
    );
    let (report, capture) = single("calc", case, TestMetadata::new());
    assert_eq!(capture.outcome("calc.testEq"), ("calc.testEq".to_string(), true, None));
    assert!(report.success());
}

#[test]
fn test_failing_comparison() {
    let case = TestCase::new().method(
        "testEq",
        Method::new(|| {
            assert_compare(&1, "===".parse::<OperatorId>().unwrap(), &2, None)?;
            Ok(())
        }),
    );
    let (report, capture) = single("calc", case, TestMetadata::new());
    let (_, pass, error) = capture.outcome("calc.testEq");
    assert!(!pass);
    assert_eq!(error.as_deref(), Some("1 === 2 is not true"));
    assert!(!report.success());
    assert_eq!(report.test.failed, 1);
}

#[test]
fn test_expected_exception_thrown() {
    let case = TestCase::new()
        .method("testRange", Method::new(|| Err(RangeError.into())))
        .expecting("testRange", ExpectedException::kind::<RangeError>());
    let (_, capture) = single("range", case, TestMetadata::new());
    assert!(capture.outcome("range.testRange").1);
}

#[test]
fn test_expected_exception_not_thrown() {
    let case = TestCase::new()
        .method("testRange", Method::new(|| Ok(())))
        .expecting("testRange", ExpectedException::kind::<RangeError>());
    let (_, capture) = single("range", case, TestMetadata::new());
    let (_, pass, error) = capture.outcome("range.testRange");
    assert!(!pass);
    assert_eq!(error.as_deref(), Some("expecting exception [RangeError]"));
}

#[test]
fn test_timeout_exceeded_by_async_method() {
    let elapsed = Rc::new(RefCell::new(None));
    let capture = Capture::default();
    let sink = Rc::clone(&elapsed);
    let timing = TimingReporter {
        inner: capture.clone(),
        elapsed: sink,
    };
    let case = TestCase::new().method(
        "testSlow",
        Method::new_async(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }),
    );
    Harness::new(config(), CaseCatalog::new())
        .with_reporter(timing)
        .run_blocking(vec![
            TestCaseDefinition::new("svc", case, TestMetadata::new().with_timeout("testSlow", 50)).into(),
        ])
        .unwrap();

    let (_, pass, error) = capture.outcome("svc.testSlow");
    assert!(!pass);
    assert_eq!(error.as_deref(), Some("exceeding maximum 50 ms"));
    let total = elapsed.borrow().unwrap();
    assert!(total >= 200 && total < 1000, "total_time was {total} ms");
}

struct TimingReporter {
    inner: Capture,
    elapsed: Rc<RefCell<Option<u128>>>,
}

impl Reporter for TimingReporter {
    fn on_suite_start(&mut self, suite: &str) {
        self.inner.on_suite_start(suite);
    }

    fn on_outcome(&mut self, method: &str, outcome: &TestOutcome) {
        *self.elapsed.borrow_mut() = Some(outcome.total_ms());
        self.inner.on_outcome(method, outcome);
    }

    fn on_run_complete(&mut self, _report: &RunReport) {}
}

#[test]
fn test_watchdog_settles_hung_method_and_run_completes() {
    let capture = Capture::default();
    let case = TestCase::new()
        .method("testHung", Method::new_async(std::future::pending::<MethodResult>))
        .method("testAfter", Method::new(|| Ok(())));
    let report = Harness::new(config().with_watchdog(true), CaseCatalog::new())
        .with_reporter(capture.clone())
        .run_blocking(vec![
            TestCaseDefinition::new("svc", case, TestMetadata::new().with_timeout("testHung", 30)).into(),
        ])
        .unwrap();

    assert_eq!(capture.names(), ["svc.testHung", "svc.testAfter"]);
    let (_, pass, error) = capture.outcome("svc.testHung");
    assert!(!pass);
    assert_eq!(error.as_deref(), Some("exceeding maximum 30 ms"));
    assert!(capture.outcome("svc.testAfter").1);
    assert_eq!((report.test.passed, report.test.failed), (1, 1));
}

#[test]
fn test_same_suite_entries_reported_in_order() {
    let (_, capture) = run(vec![
        TestCaseDefinition::new(
            "db.users",
            TestCase::new().method(
                "testSlowInsert",
                Method::new_async(|| async {
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    Ok(())
                }),
            ),
            TestMetadata::new().with_suite("db"),
        ),
        TestCaseDefinition::new(
            "db.orders",
            TestCase::new().method("testQuick", Method::new(|| Ok(()))),
            TestMetadata::new().with_suite("db"),
        ),
    ]);
    assert_eq!(*capture.suites.borrow(), ["db", "db"]);
    assert_eq!(capture.names(), ["db.users.testSlowInsert", "db.orders.testQuick"]);
}

#[test]
fn test_missing_suite_uses_default() {
    let (_, capture) = single("plain", TestCase::new(), TestMetadata::new());
    assert_eq!(*capture.suites.borrow(), ["default", "default"]);
}

// ============================================================================
// Phase ordering
// ============================================================================

fn logging(log: &Rc<RefCell<Vec<String>>>, entry: &'static str) -> Method {
    let log = Rc::clone(log);
    Method::new(move || {
        log.borrow_mut().push(entry.to_string());
        Ok(())
    })
}

fn logging_async(log: &Rc<RefCell<Vec<String>>>, entry: &'static str, ms: u64) -> Method {
    let log = Rc::clone(log);
    Method::new_async(move || {
        let log = Rc::clone(&log);
        async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            log.borrow_mut().push(entry.to_string());
            MethodResult::Ok(())
        }
    })
}

#[test]
fn test_no_test_method_starts_before_setup_resolves() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (report, _) = run(vec![
        TestCaseDefinition::new(
            "a",
            TestCase::new()
                .method("testA", logging(&log, "testA"))
                .method("setupA", logging_async(&log, "setupA", 40)),
            TestMetadata::new().with_suite("slow"),
        ),
        TestCaseDefinition::new(
            "b",
            TestCase::new()
                .method("setupB", logging(&log, "setupB"))
                .method("testB", logging(&log, "testB")),
            TestMetadata::new().with_suite("fast"),
        ),
    ]);
    assert_eq!(*log.borrow(), ["setupB", "setupA", "testA", "testB"]);
    assert_eq!((report.setup.total, report.test.total), (2, 2));
}

#[test]
fn test_failed_setup_does_not_skip_tests() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (report, capture) = single(
        "a",
        TestCase::new()
            .method("setupA", Method::new(|| suiterun::throw("no database")))
            .method("testA", logging(&log, "testA")),
        TestMetadata::new(),
    );
    assert_eq!(*log.borrow(), ["testA"]);
    assert_eq!(capture.outcome("a.setupA").2.as_deref(), Some("no database"));
    assert_eq!((report.setup.failed, report.test.passed), (1, 1));
}

#[tokio::test(flavor = "current_thread")]
async fn test_run_inside_local_set() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let case = TestCase::new()
        .method("setupA", logging_async(&log, "setupA", 10))
        .method("testA", logging_async(&log, "testA", 1));
    let report = tokio::task::LocalSet::new()
        .run_until(
            Harness::new(config(), CaseCatalog::new())
                .with_reporter(Capture::default())
                .run(vec![TestCaseDefinition::new("a", case, TestMetadata::new()).into()]),
        )
        .await
        .unwrap();
    assert!(report.success());
    assert_eq!(*log.borrow(), ["setupA", "testA"]);
}

// ============================================================================
// Accessor idempotence
// ============================================================================

#[test]
fn test_accessor_returns_same_outcome() {
    let tester = Tester::new();
    tester.wrap(Method::new(|| suiterun::throw("boom"))).invoke();
    let accessor = tester.result_accessor();
    let first = accessor.try_outcome().unwrap();
    for _ in 0..3 {
        assert!(Rc::ptr_eq(&first, &accessor.try_outcome().unwrap()));
    }
    assert!(!first.pass);
}

// ============================================================================
// Definition files
// ============================================================================

#[test]
fn test_sample_definitions_end_to_end() {
    let buf = SharedBuf::default();
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/sample.json");
    let report = Harness::new(config(), suiterun::sample::catalog())
        .with_reporter(ConsoleReporter::new(buf.clone(), false))
        .run_blocking(vec![path.into()])
        .unwrap();

    let output = String::from_utf8(buf.0.borrow().clone()).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(report.setup.total, 2);
    assert_eq!(report.setup.failed, 0);
    assert_eq!(report.test.total, 11);
    assert_eq!(report.test.failed, 3);

    let fail = |name: &str| {
        lines
            .iter()
            .position(|l| l.starts_with(&format!("  Fail   {name} (")))
            .unwrap_or_else(|| panic!("missing failure line for {name}\n{output}"))
    };
    assert_eq!(lines[fail("calc.arithmetic.testNotEqual") + 1], "    1 === 2 is not true");
    assert_eq!(
        lines[fail("calc.ranges.testInRange") + 1],
        "    expecting exception [RangeError]"
    );
    assert_eq!(lines[fail("timing.slow.testSlow") + 1], "    exceeding maximum 50 ms");
    assert!(lines.iter().any(|l| l.starts_with("  Pass   db.orders.testTable (")));
    assert!(lines.iter().any(|l| l.starts_with("  Pass   calc.ranges.testRejected (")));

    let footer = lines[lines.len() - 2..].to_vec();
    assert!(footer[0].chars().all(|c| c == '='));
    assert!(footer[1].starts_with("Total Test Run Time: ") && footer[1].ends_with("ms"));
}
