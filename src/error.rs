//! Run-level errors
//!
//! These abort a run before any method executes. Per-method failures never surface here; they are captured by
//! the tester and reported as [`crate::engine::Failure`] outcomes.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("failed to load test definitions from `{path}`: {reason}")]
    #[diagnostic(
        code(suiterun::definition_load),
        help("definition files are JSON objects with a top-level `beanDefinitions` array")
    )]
    DefinitionLoad { path: String, reason: String },

    #[error("no test case registered for path `{0}`")]
    #[diagnostic(
        code(suiterun::unknown_case),
        help("register a constructor for this path in the CaseCatalog before running")
    )]
    UnknownCase(String),

    #[error("cannot resolve parameter `{reference}` for method `{method}`")]
    #[diagnostic(
        code(suiterun::inject),
        help("provide a value for the reference on the injector, or pass a literal parameter instead")
    )]
    Inject { method: String, reference: String },

    #[error("failed to start the cooperative runtime")]
    #[diagnostic(code(suiterun::runtime))]
    Runtime(#[source] std::io::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
