//! Method outcomes

use std::fmt::Write as _;
use std::time::Duration;

use suiterun_core::AssertionFailure;
use thiserror::Error;

use crate::case::Thrown;

/// Why a method failed.
#[derive(Debug, Error)]
pub enum Failure {
    /// A comparison in the method body did not hold.
    #[error("{0}")]
    Assertion(AssertionFailure),

    /// The method threw something no declaration matched.
    #[error("{0}")]
    Unexpected(Thrown),

    /// The method completed normally although it declared an expected exception.
    #[error("expecting exception [{expected}]")]
    ExpectedExceptionNotThrown { expected: String },

    /// The method took longer than its tolerance.
    #[error("exceeding maximum {tolerance_ms} ms")]
    TimeoutExceeded { tolerance_ms: u64, elapsed: Duration },
}

impl Failure {
    /// Classify an unmatched thrown value.
    pub fn from_thrown(thrown: Thrown) -> Self {
        match thrown {
            Thrown::Error(err) => match err.downcast::<AssertionFailure>() {
                Ok(assertion) => Failure::Assertion(*assertion),
                Err(other) => Failure::Unexpected(Thrown::Error(other)),
            },
            other => Failure::Unexpected(other),
        }
    }

    /// The message followed by the `source()` chain of a thrown error object, one cause per line.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        if let Failure::Unexpected(thrown) = self {
            let mut source = thrown.as_error().and_then(|err| err.source());
            while let Some(cause) = source {
                let _ = write!(detail, "\ncaused by: {cause}");
                source = cause.source();
            }
        }
        detail
    }
}

/// The final pass/fail/error/timing record for one method invocation.
#[derive(Debug)]
pub struct TestOutcome {
    pub pass: bool,
    pub error: Option<Failure>,
    pub total_time: Option<Duration>,
}

impl TestOutcome {
    pub fn passed(total_time: Duration) -> Self {
        Self {
            pass: true,
            error: None,
            total_time: Some(total_time),
        }
    }

    pub fn failed(error: Failure, total_time: Option<Duration>) -> Self {
        Self {
            pass: false,
            error: Some(error),
            total_time,
        }
    }

    /// Elapsed whole milliseconds, `0` when no timing was recorded.
    pub fn total_ms(&self) -> u128 {
        self.total_time.map_or(0, |d| d.as_millis())
    }
}
