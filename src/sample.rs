//! Sample case catalog used by the `suiterun` demo binary and `demos/sample.json`. Not part of the library's
//! supported API.
//!
//! Each case exercises one harness behavior: comparisons, expected exceptions, a tolerance overrun, and a
//! two-case `db` suite whose setup method runs asynchronously before its tests.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use suiterun_core::{OperatorId, assert_compare};
use thiserror::Error;

use crate::case::{ExpectedException, Method, TestCase, throw};
use crate::definition::CaseCatalog;

#[derive(Debug, Error)]
#[error("index {index} out of range 0..{len}")]
pub struct RangeError {
    pub index: usize,
    pub len: usize,
}

fn element(items: &[i64], index: usize) -> Result<i64, RangeError> {
    items.get(index).copied().ok_or(RangeError {
        index,
        len: items.len(),
    })
}

/// All sample cases, keyed by the paths `demos/sample.json` refers to.
pub fn catalog() -> CaseCatalog {
    CaseCatalog::new()
        .register("calc.arithmetic", arithmetic)
        .register("calc.ranges", ranges)
        .register("timing.slow", slow)
        .register("db.users", || db_case("users"))
        .register("db.orders", || db_case("orders"))
}

fn arithmetic() -> TestCase {
    TestCase::new()
        .method(
            "testEqual",
            Method::new(|| {
                assert_compare(&1, OperatorId::Eq, &1, None)?;
                Ok(())
            }),
        )
        .method(
            "testNotEqual",
            Method::new(|| {
                assert_compare(&1, OperatorId::Eq, &2, None)?;
                Ok(())
            }),
        )
        .method(
            "testOrdering",
            Method::new(|| {
                assert_compare(&2.5, OperatorId::Lt, &3.0, Some("2.5 should sort before 3"))?;
                Ok(())
            }),
        )
}

fn ranges() -> TestCase {
    TestCase::new()
        .method(
            "testOutOfRange",
            Method::new(|| {
                element(&[1, 2, 3], 7)?;
                Ok(())
            }),
        )
        .method(
            "testInRange",
            Method::new(|| {
                element(&[1, 2, 3], 1)?;
                Ok(())
            }),
        )
        .method("testRejected", Method::new(|| throw("rejected")))
        .expecting("testOutOfRange", ExpectedException::kind::<RangeError>())
        .expecting("testInRange", ExpectedException::kind::<RangeError>())
}

fn slow() -> TestCase {
    TestCase::new().method(
        "testSlow",
        Method::new_async(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }),
    )
}

fn db_case(table: &'static str) -> TestCase {
    let connected = Rc::new(Cell::new(false));
    let on_setup = Rc::clone(&connected);
    TestCase::new()
        .method(
            "setupConnection",
            Method::new_async(move || {
                let connected = Rc::clone(&on_setup);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    connected.set(true);
                    Ok(())
                }
            }),
        )
        .method(
            "testConnected",
            Method::new(move || {
                assert_compare(&connected.get(), OperatorId::Eq, &true, Some("setup did not connect"))?;
                Ok(())
            }),
        )
        .method(
            "testTable",
            Method::with_params(move |params| {
                let name = params.first().and_then(Value::as_str).unwrap_or(table);
                assert_compare(name, OperatorId::Eq, table, None)?;
                Ok(())
            }),
        )
}
