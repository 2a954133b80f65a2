//! Test case objects: phase methods, thrown values, and expected-exception declarations.
//!
//! A [`TestCase`] is an explicit, ordered list of named methods built at registration time. The phase of a method
//! is derived from its name: `setup*` methods run in [`Phase::Setup`], `test*` methods in [`Phase::Test`]. Any
//! other method is a helper and is never selected by the executor.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use serde_json::Value;

/// What a method body produces: `Ok(())` on normal return, `Err(thrown)` when it "throws".
pub type MethodResult = Result<(), Thrown>;

/// Future returned by asynchronous method bodies. Runs on the local cooperative scheduler, so no `Send` bound.
pub type MethodFuture = Pin<Box<dyn Future<Output = MethodResult>>>;

type SyncBody = Rc<dyn Fn(&[Value]) -> MethodResult>;
type AsyncBody = Rc<dyn Fn(Vec<Value>) -> MethodFuture>;

// ============================================================================
// Phases
// ============================================================================

/// One of the two execution passes applied across all suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Test,
}

impl Phase {
    /// Name prefix selecting the methods of this phase (case-sensitive).
    pub const fn prefix(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Test => "test",
        }
    }

    /// Classify a method name by its prefix.
    pub fn of_method(name: &str) -> Option<Phase> {
        [Phase::Setup, Phase::Test]
            .into_iter()
            .find(|phase| name.starts_with(phase.prefix()))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

// ============================================================================
// Thrown values
// ============================================================================

/// A value thrown out of a method body.
#[derive(Debug)]
pub enum Thrown {
    /// A thrown string literal; matched by equality.
    Message(String),
    /// A typed error object; matched by type membership.
    Error(Box<dyn Error + 'static>),
    /// A caught panic. Never matches an expected-exception declaration.
    Panic(String),
}

impl Thrown {
    pub fn message(message: impl Into<String>) -> Self {
        Thrown::Message(message.into())
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Thrown::Message(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Thrown::Error(_))
    }

    pub fn as_error(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Thrown::Error(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Build a `Thrown` from a panic payload caught by `catch_unwind` or a join handle.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let text = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        Thrown::Panic(text)
    }
}

impl<E> From<E> for Thrown
where
    E: Error + 'static,
{
    fn from(err: E) -> Self {
        Thrown::Error(Box::new(err))
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thrown::Message(message) => f.write_str(message),
            Thrown::Error(err) => write!(f, "{err}"),
            Thrown::Panic(message) => write!(f, "panicked: {message}"),
        }
    }
}

/// Throw a string literal out of a method body.
pub fn throw<T>(message: impl Into<String>) -> Result<T, Thrown> {
    Err(Thrown::message(message))
}

// ============================================================================
// Expected exceptions
// ============================================================================

/// A declaration that a method is expected to throw.
#[derive(Clone)]
pub enum ExpectedException {
    /// Matches a thrown [`Thrown::Message`] equal to this text.
    Literal(String),
    /// Matches a thrown [`Thrown::Error`] of a given error type.
    Kind {
        name: &'static str,
        matches: fn(&(dyn Error + 'static)) -> bool,
    },
}

impl ExpectedException {
    pub fn literal(text: impl Into<String>) -> Self {
        ExpectedException::Literal(text.into())
    }

    /// Expect an error of type `E`, matched with a downcast.
    pub fn kind<E>() -> Self
    where
        E: Error + 'static,
    {
        let full = std::any::type_name::<E>();
        let name = full.rsplit("::").next().unwrap_or(full);
        ExpectedException::Kind {
            name,
            matches: |err| err.is::<E>(),
        }
    }

    /// Name used in reports, e.g. `RangeError`.
    pub fn identifier(&self) -> &str {
        match self {
            ExpectedException::Literal(text) => text,
            ExpectedException::Kind { name, .. } => name,
        }
    }

    /// Strings match by equality, error objects by type membership, anything else never matches.
    pub fn matches(&self, thrown: &Thrown) -> bool {
        match (self, thrown) {
            (ExpectedException::Literal(expected), Thrown::Message(message)) => expected == message,
            (ExpectedException::Kind { matches, .. }, Thrown::Error(err)) => matches(err.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for ExpectedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedException::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            ExpectedException::Kind { name, .. } => f.debug_tuple("Kind").field(name).finish(),
        }
    }
}

// ============================================================================
// Methods
// ============================================================================

/// A callable method body, synchronous or asynchronous, receiving its (possibly injected) parameters.
#[derive(Clone)]
pub enum Method {
    Sync(SyncBody),
    Async(AsyncBody),
}

impl Method {
    /// Zero-parameter synchronous method.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn() -> MethodResult + 'static,
    {
        Method::Sync(Rc::new(move |_: &[Value]| body()))
    }

    /// Synchronous method that receives injected parameters.
    pub fn with_params<F>(body: F) -> Self
    where
        F: Fn(&[Value]) -> MethodResult + 'static,
    {
        Method::Sync(Rc::new(body))
    }

    /// Zero-parameter asynchronous method.
    pub fn new_async<F, Fut>(body: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = MethodResult> + 'static,
    {
        Method::Async(Rc::new(move |_: Vec<Value>| Box::pin(body()) as MethodFuture))
    }

    /// Asynchronous method that receives injected parameters.
    pub fn with_params_async<F, Fut>(body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + 'static,
        Fut: Future<Output = MethodResult> + 'static,
    {
        Method::Async(Rc::new(move |params: Vec<Value>| Box::pin(body(params)) as MethodFuture))
    }

    /// Produce a method that ignores its call-site arguments and always forwards `params`.
    pub fn bind(self, params: Rc<[Value]>) -> Self {
        match self {
            Method::Sync(body) => Method::Sync(Rc::new(move |_: &[Value]| body(&params))),
            Method::Async(body) => Method::Async(Rc::new(move |_: Vec<Value>| body(params.to_vec()))),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Method::Async(_))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_async() { "Method::Async" } else { "Method::Sync" })
    }
}

// ============================================================================
// Test cases
// ============================================================================

/// A named method on a test case.
#[derive(Debug, Clone)]
pub struct CaseMethod {
    pub name: String,
    pub method: Method,
    pub expected: Option<ExpectedException>,
}

impl CaseMethod {
    pub fn phase(&self) -> Option<Phase> {
        Phase::of_method(&self.name)
    }
}

/// A test case object: an ordered list of methods.
#[derive(Debug, Clone, Default)]
pub struct TestCase {
    methods: Vec<CaseMethod>,
}

impl TestCase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method. Re-adding an existing name replaces its body but keeps its position.
    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        let name = name.into();
        match self.methods.iter_mut().find(|m| m.name == name) {
            Some(existing) => existing.method = method,
            None => self.methods.push(CaseMethod {
                name,
                method,
                expected: None,
            }),
        }
        self
    }

    /// Declare that `name` is expected to throw. Ignored (with a warning) if no such method exists.
    pub fn expecting(mut self, name: &str, expected: ExpectedException) -> Self {
        match self.methods.iter_mut().find(|m| m.name == name) {
            Some(existing) => existing.expected = Some(expected),
            None => tracing::warn!(method = name, "expected exception declared for unknown method"),
        }
        self
    }

    pub fn methods(&self) -> &[CaseMethod] {
        &self.methods
    }

    pub fn get(&self, name: &str) -> Option<&CaseMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Methods whose name starts with `prefix`, in registration order.
    pub fn methods_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a CaseMethod> + 'a {
        self.methods.iter().filter(move |m| m.name.starts_with(prefix))
    }

    /// Replace each method body through `replace`, keeping names, order, and declarations.
    pub fn map_methods(mut self, replace: &mut dyn FnMut(&str, Method) -> Method) -> Self {
        for entry in &mut self.methods {
            let original = entry.method.clone();
            entry.method = replace(&entry.name, original);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, thiserror::Error)]
    #[error("out of range")]
    struct RangeError;

    #[derive(Debug, thiserror::Error)]
    #[error("bad type")]
    struct TypeError;

    #[test]
    fn test_phase_from_prefix_is_case_sensitive() {
        assert_eq!(Phase::of_method("setupDb"), Some(Phase::Setup));
        assert_eq!(Phase::of_method("testInsert"), Some(Phase::Test));
        assert_eq!(Phase::of_method("TestInsert"), None);
        assert_eq!(Phase::of_method("helper"), None);
    }

    #[test]
    fn test_literal_matches_only_equal_strings() {
        let expected = ExpectedException::literal("boom");
        assert!(expected.matches(&Thrown::message("boom")));
        assert!(!expected.matches(&Thrown::message("bang")));
        assert!(!expected.matches(&Thrown::from(RangeError)));
    }

    #[test]
    fn test_kind_matches_by_type_membership() {
        let expected = ExpectedException::kind::<RangeError>();
        assert_eq!(expected.identifier(), "RangeError");
        assert!(expected.matches(&Thrown::from(RangeError)));
        assert!(!expected.matches(&Thrown::from(TypeError)));
        assert!(!expected.matches(&Thrown::message("RangeError")));
    }

    #[test]
    fn test_panics_never_match() {
        let expected = ExpectedException::literal("boom");
        assert!(!expected.matches(&Thrown::Panic("boom".to_string())));
    }

    #[test]
    fn test_bind_forwards_bound_params() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let method = Method::with_params(move |params| {
            sink.borrow_mut().extend_from_slice(params);
            Ok(())
        });
        let bound = method.bind(Rc::from(vec![Value::from(7), Value::from("x")]));
        let Method::Sync(body) = bound else {
            panic!("expected sync method");
        };
        body(&[]).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::from(7), Value::from("x")]);
    }

    #[test]
    fn test_methods_keep_registration_order() {
        let case = TestCase::new()
            .method("testB", Method::new(|| Ok(())))
            .method("setupA", Method::new(|| Ok(())))
            .method("testA", Method::new(|| Ok(())));
        let names: Vec<_> = case.methods_with_prefix("test").map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["testB", "testA"]);
    }

    #[test]
    fn test_expecting_attaches_to_named_method() {
        let case = TestCase::new()
            .method("testRange", Method::new(|| Ok(())))
            .expecting("testRange", ExpectedException::kind::<RangeError>());
        assert!(case.get("testRange").unwrap().expected.is_some());
    }
}
