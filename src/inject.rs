//! Parameter injection and method interception
//!
//! The registry resolves each case's declared method parameters through an [`Injector`] and then rebuilds the
//! case through an [`Interceptor`], turning every parameterised method into a zero-argument callable.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::case::{Method, TestCase};
use crate::definition::ParamSpec;
use crate::error::{HarnessError, HarnessResult};

/// Resolves declared parameter specs into argument lists, per method.
pub trait Injector {
    /// ## Errors
    ///
    /// Returns [`HarnessError::Inject`] when a declared parameter cannot be resolved. The error propagates out of
    /// registration before any method runs.
    fn inject(&self, inject_methods: &BTreeMap<String, Vec<ParamSpec>>) -> HarnessResult<HashMap<String, Vec<Value>>>;
}

/// Rebuilds a test case, letting `replace` substitute each method.
pub trait Interceptor {
    /// Implementations must keep every method `replace` leaves alone unchanged.
    fn intercept(&self, case: TestCase, replace: &mut dyn FnMut(&str, Method) -> Method) -> TestCase;
}

/// Default injector: literal values pass through, `ref:` specs resolve against provided values.
#[derive(Debug, Clone, Default)]
pub struct ValueInjector {
    provided: HashMap<String, Value>,
}

impl ValueInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `value` available to `ref:<name>` parameter specs.
    pub fn provide(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.provided.insert(name.into(), value.into());
        self
    }

    fn resolve(&self, method: &str, spec: &ParamSpec) -> HarnessResult<Value> {
        match spec {
            ParamSpec::Value(value) => Ok(value.clone()),
            ParamSpec::Ref(name) => self.provided.get(name).cloned().ok_or_else(|| HarnessError::Inject {
                method: method.to_string(),
                reference: name.clone(),
            }),
        }
    }
}

impl Injector for ValueInjector {
    fn inject(&self, inject_methods: &BTreeMap<String, Vec<ParamSpec>>) -> HarnessResult<HashMap<String, Vec<Value>>> {
        inject_methods
            .iter()
            .map(|(method, specs)| {
                let args = specs
                    .iter()
                    .map(|spec| self.resolve(method, spec))
                    .collect::<HarnessResult<Vec<_>>>()?;
                Ok((method.clone(), args))
            })
            .collect()
    }
}

/// Default interceptor: visits every method of the case in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodInterceptor;

impl Interceptor for MethodInterceptor {
    fn intercept(&self, case: TestCase, replace: &mut dyn FnMut(&str, Method) -> Method) -> TestCase {
        case.map_methods(replace)
    }
}
