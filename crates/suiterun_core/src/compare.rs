//! Expected/actual comparison used by test case bodies.
//!
//! [`compare`] answers whether `expected <op> actual` holds. [`assert_compare`] turns a `false` answer into an
//! [`AssertionFailure`] so a test body can bail out with `?`.
//!
//! ## Examples
//! ```rust
//! use suiterun_core::{OperatorId, assert_compare, compare};
//!
//! assert!(compare(&1, OperatorId::Eq, &1));
//! let err = assert_compare(&1, OperatorId::Eq, &2, None).unwrap_err();
//! assert_eq!(err.to_string(), "1 === 2 is not true");
//! ```

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::operators::OperatorId;

/// An expected/actual mismatch raised by [`assert_compare`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    /// Create a failure with a custom message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Create a failure whose message is generated from the comparison that did not hold.
    pub fn from_comparison(expected: &dyn fmt::Display, op: OperatorId, actual: &dyn fmt::Display) -> Self {
        Self::new(format!("{expected} {op} {actual} is not true"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Evaluate `expected <op> actual`.
///
/// Relational operators follow `PartialOrd`: incomparable values (e.g. `NaN`) make every relational comparison
/// false, while `!==` stays true.
pub fn compare<E, A>(expected: &E, op: OperatorId, actual: &A) -> bool
where
    E: PartialOrd<A> + ?Sized,
    A: ?Sized,
{
    if !op.is_relational() {
        return (expected == actual) == (op == OperatorId::Eq);
    }
    let ordering = expected.partial_cmp(actual);
    match op {
        OperatorId::Lt => matches!(ordering, Some(Ordering::Less)),
        OperatorId::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        OperatorId::Gt => matches!(ordering, Some(Ordering::Greater)),
        OperatorId::GtEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        OperatorId::Eq | OperatorId::NotEq => unreachable!("equality operators are not relational"),
    }
}

/// Assert `expected <op> actual`, failing with `message` or a generated one.
///
/// ## Errors
/// - [`AssertionFailure`] when the comparison does not hold. Without a custom message the text reads
///   `"<expected> <op> <actual> is not true"`.
pub fn assert_compare<E, A>(
    expected: &E,
    op: OperatorId,
    actual: &A,
    message: Option<&str>,
) -> Result<(), AssertionFailure>
where
    E: PartialOrd<A> + fmt::Display + ?Sized,
    A: fmt::Display + ?Sized,
{
    if compare(expected, op, actual) {
        return Ok(());
    }
    Err(match message {
        Some(custom) => AssertionFailure::new(custom),
        None => AssertionFailure::from_comparison(&expected, op, &actual),
    })
}
