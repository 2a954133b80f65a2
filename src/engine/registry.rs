//! Suite registry: groups parameter-bound test cases into named suites.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::timer::MethodTimer;
use crate::case::TestCase;
use crate::definition::TestMetadata;
use crate::error::HarnessResult;
use crate::inject::{Injector, Interceptor, MethodInterceptor, ValueInjector};

/// One registered test case.
#[derive(Debug, Clone)]
pub struct SuiteEntry {
    pub path: String,
    /// The case with injected parameters bound into its methods.
    pub case: TestCase,
    /// Per-method timer templates; methods without one use the run's default tolerance.
    pub method_timers: HashMap<String, MethodTimer>,
}

/// A named, ordered group of entries.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub entries: Vec<SuiteEntry>,
}

/// Suites in first-registration order. Written during registration only.
pub struct SuiteRegistry {
    suites: Vec<Suite>,
    injector: Box<dyn Injector>,
    interceptor: Box<dyn Interceptor>,
}

impl Default for SuiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::with_collaborators(Box::new(ValueInjector::new()), Box::new(MethodInterceptor))
    }

    pub fn with_collaborators(injector: Box<dyn Injector>, interceptor: Box<dyn Interceptor>) -> Self {
        Self {
            suites: Vec::new(),
            injector,
            interceptor,
        }
    }

    /// Bind injected parameters into `case` and append it to its suite.
    ///
    /// ## Errors
    ///
    /// Injector failures propagate unchanged; nothing is registered in that case.
    pub fn add_case(
        &mut self,
        metadata: &TestMetadata,
        path: &str,
        case: TestCase,
        method_timers: HashMap<String, MethodTimer>,
    ) -> HarnessResult<()> {
        let suite_name = metadata.suite_name();
        let parameters: HashMap<String, Rc<[Value]>> = self
            .injector
            .inject(&metadata.inject_methods)?
            .into_iter()
            .map(|(method, args)| (method, Rc::from(args)))
            .collect();

        let bound = self.interceptor.intercept(case, &mut |name, method| match parameters.get(name) {
            Some(params) => method.bind(Rc::clone(params)),
            None => method,
        });

        tracing::debug!(suite = suite_name, path, "registered test case");
        let entry = SuiteEntry {
            path: path.to_string(),
            case: bound,
            method_timers,
        };
        match self.suites.iter_mut().find(|s| s.name == suite_name) {
            Some(suite) => suite.entries.push(entry),
            None => self.suites.push(Suite {
                name: suite_name.to_string(),
                entries: vec![entry],
            }),
        }
        Ok(())
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn suite(&self, name: &str) -> Option<&Suite> {
        self.suites.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
