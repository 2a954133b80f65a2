#![forbid(unsafe_code)]
//! suiterun: a lightweight two-phase test execution harness
//!
//! Test cases are registered into named suites, then every `setup*` method across all suites runs to completion
//! before any `test*` method starts. Each method runs behind a [`engine::Tester`] proxy that records timing,
//! matches declared expected exceptions, and exposes a non-blocking result accessor. The
//! [`engine::ResultPoller`] samples those accessors, reports outcomes in registration order, and lets the run
//! proceed to the next phase.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Test method bodies**: panics inside a registered method are caught by its tester and reported as a failed
//!   outcome; they never abort the run.

pub mod case;
pub mod cli;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod inject;
pub mod report;
pub mod run;
#[doc(hidden)]
pub mod sample;

pub use case::{CaseMethod, ExpectedException, Method, MethodResult, Phase, TestCase, Thrown, throw};
pub use config::RunConfig;
pub use definition::{CaseCatalog, DefinitionSource, ParamSpec, TestCaseDefinition, TestMetadata};
pub use engine::{Executor, MethodTimer, PendingResult, ResultAccessor, ResultPoller, SuiteRegistry, Tester};
pub use error::HarnessError;
pub use report::{ConsoleReporter, PhaseSummary, Reporter, RunReport};
pub use run::Harness;

pub use suiterun_core::{AssertionFailure, OperatorId, assert_compare, compare};
