//! Execution and result-aggregation engine
//!
//! ## Modules
//!
//! - `timer` - Per-invocation start/end timestamps and tolerance
//! - `outcome` - Outcomes and failure kinds
//! - `tester` - Timing/exception-aware proxy around one method
//! - `registry` - Suites of parameter-bound test cases
//! - `executor` - One execution pass over all suites
//! - `poller` - Cooperative completion watcher and reporting
//!
//! ## Design
//!
//! Everything runs on one thread. Synchronous methods complete inside the executor's pass; asynchronous ones are
//! spawned on the current `LocalSet`. Completion is observed through [`ResultAccessor::try_outcome`], which never
//! blocks, and the poller is woken early by a shared completion signal.

pub mod executor;
pub mod outcome;
pub mod poller;
pub mod registry;
pub mod tester;
pub mod timer;

pub use executor::{Executor, PendingResult, PhaseResults, SuiteResults};
pub use outcome::{Failure, TestOutcome};
pub use poller::ResultPoller;
pub use registry::{Suite, SuiteEntry, SuiteRegistry};
pub use tester::{Proxy, ResultAccessor, Tester};
pub use timer::MethodTimer;
