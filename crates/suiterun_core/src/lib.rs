//! Provide the comparison vocabulary shared by the suiterun harness and the test cases it runs.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic helpers that:
//! - test case bodies use to assert expected/actual relationships, and
//! - the harness uses to classify assertion failures when reporting outcomes.
//!
//! ## Notes
//!
//! - No IO, no global state, no harness-specific types.
//! - Operator lookup is **case-sensitive** and accepts both strict (`===`) and loose (`==`) spellings. With static
//!   typing the two spellings compare identically.

pub mod compare;
pub mod operators;

pub use compare::{AssertionFailure, assert_compare, compare};
pub use operators::{OperatorId, UnknownOperator};
