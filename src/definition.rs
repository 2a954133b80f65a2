//! Test case definitions and the loader that turns definition sources into them.
//!
//! A definition source is either an inline [`TestCaseDefinition`] or a JSON file:
//!
//! ```json
//! { "beanDefinitions": [
//!     { "path": "db.users", "test": { "suite": "db", "timeout": { "testSlow": 50 } } },
//!     { "path": "db.pool" }
//! ] }
//! ```
//!
//! Entries without a `test` object are not test cases and are skipped. Each remaining `path` is instantiated
//! through the [`CaseCatalog`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::case::TestCase;
use crate::engine::MethodTimer;
use crate::error::{HarnessError, HarnessResult};

/// Prefix marking a parameter spec as a reference resolved by the injector.
pub const REF_PREFIX: &str = "ref:";

// ============================================================================
// Metadata
// ============================================================================

/// One declared parameter of an injected method.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum ParamSpec {
    /// Passed through unchanged.
    Value(Value),
    /// Resolved by name through the injector (`"ref:<name>"` in JSON).
    Ref(String),
}

impl ParamSpec {
    pub fn value(value: impl Into<Value>) -> Self {
        ParamSpec::Value(value.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        ParamSpec::Ref(name.into())
    }
}

impl From<Value> for ParamSpec {
    fn from(value: Value) -> Self {
        match value.as_str().and_then(|s| s.strip_prefix(REF_PREFIX)) {
            Some(name) => ParamSpec::Ref(name.to_string()),
            None => ParamSpec::Value(value),
        }
    }
}

/// The `test` metadata object that marks a definition as a test case.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestMetadata {
    pub suite: Option<String>,
    pub inject_methods: BTreeMap<String, Vec<ParamSpec>>,
    /// Raw per-method tolerances; see [`parse_timeouts`].
    pub timeout: BTreeMap<String, Value>,
    /// Per-method expected exceptions, matched as string literals.
    pub expect_exceptions: BTreeMap<String, String>,
}

impl TestMetadata {
    pub const DEFAULT_SUITE: &'static str = "default";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self
    }

    pub fn with_timeout(mut self, method: impl Into<String>, tolerance_ms: impl Into<Value>) -> Self {
        self.timeout.insert(method.into(), tolerance_ms.into());
        self
    }

    pub fn with_injected(mut self, method: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        self.inject_methods.insert(method.into(), params);
        self
    }

    pub fn with_expected_exception(mut self, method: impl Into<String>, literal: impl Into<String>) -> Self {
        self.expect_exceptions.insert(method.into(), literal.into());
        self
    }

    /// Suite name, defaulting to `"default"`.
    pub fn suite_name(&self) -> &str {
        self.suite.as_deref().unwrap_or(Self::DEFAULT_SUITE)
    }
}

/// Parse raw timeout entries into per-method timers.
///
/// Accepts non-negative integers (including integral floats such as `20.0`) and strings holding one. Anything
/// else is dropped with a warning, as if no timeout were configured for that method.
pub fn parse_timeouts(raw: &BTreeMap<String, Value>) -> HashMap<String, MethodTimer> {
    raw.iter()
        .filter_map(|(method, value)| {
            let parsed = match value {
                Value::Number(n) => whole_millis(n),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            };
            match parsed {
                Some(ms) => Some((method.clone(), MethodTimer::with_tolerance_ms(ms))),
                None => {
                    tracing::warn!(method = %method, value = %value, "ignoring malformed timeout");
                    None
                }
            }
        })
        .collect()
}

fn whole_millis(n: &serde_json::Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

// ============================================================================
// Definitions and sources
// ============================================================================

/// A test case ready for registration.
#[derive(Debug, Clone)]
pub struct TestCaseDefinition {
    pub path: String,
    pub test_case: TestCase,
    pub metadata: TestMetadata,
}

impl TestCaseDefinition {
    pub fn new(path: impl Into<String>, test_case: TestCase, metadata: TestMetadata) -> Self {
        Self {
            path: path.into(),
            test_case,
            metadata,
        }
    }
}

/// Where definitions come from.
#[derive(Debug, Clone)]
pub enum DefinitionSource {
    File(PathBuf),
    Inline(TestCaseDefinition),
}

impl From<TestCaseDefinition> for DefinitionSource {
    fn from(definition: TestCaseDefinition) -> Self {
        DefinitionSource::Inline(definition)
    }
}

impl From<PathBuf> for DefinitionSource {
    fn from(path: PathBuf) -> Self {
        DefinitionSource::File(path)
    }
}

#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(rename = "beanDefinitions")]
    bean_definitions: Vec<BeanDefinition>,
}

#[derive(Debug, Deserialize)]
struct BeanDefinition {
    path: String,
    #[serde(default)]
    test: Option<TestMetadata>,
}

// ============================================================================
// Case catalog
// ============================================================================

type CaseConstructor = Rc<dyn Fn() -> TestCase>;

/// Constructors for test case objects, keyed by definition path.
#[derive(Clone, Default)]
pub struct CaseCatalog {
    constructors: BTreeMap<String, CaseConstructor>,
}

impl CaseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, path: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> TestCase + 'static,
    {
        self.constructors.insert(path.into(), Rc::new(constructor));
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.constructors.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Construct a fresh case object for `path`.
    pub fn instantiate(&self, path: &str) -> HarnessResult<TestCase> {
        self.constructors
            .get(path)
            .map(|constructor| constructor())
            .ok_or_else(|| HarnessError::UnknownCase(path.to_string()))
    }
}

impl fmt::Debug for CaseCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Resolve every source into test case definitions, in source order.
///
/// ## Errors
///
/// Fails on the first unreadable or malformed file, or on a test entry whose path is not in `catalog`.
#[tracing::instrument(skip_all, fields(source_count = sources.len()))]
pub fn load_definitions(
    sources: Vec<DefinitionSource>,
    catalog: &CaseCatalog,
) -> HarnessResult<Vec<TestCaseDefinition>> {
    let mut definitions = Vec::new();
    for source in sources {
        match source {
            DefinitionSource::Inline(definition) => definitions.push(definition),
            DefinitionSource::File(path) => definitions.extend(load_file(&path, catalog)?),
        }
    }
    tracing::debug!(definition_count = definitions.len(), "loaded test definitions");
    Ok(definitions)
}

fn load_file(path: &Path, catalog: &CaseCatalog) -> HarnessResult<Vec<TestCaseDefinition>> {
    let load_error = |reason: String| HarnessError::DefinitionLoad {
        path: path.display().to_string(),
        reason,
    };

    let source = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let file: DefinitionFile = serde_json::from_str(&source).map_err(|e| load_error(e.to_string()))?;

    let mut definitions = Vec::new();
    for bean in file.bean_definitions {
        let Some(metadata) = bean.test else {
            tracing::debug!(path = %bean.path, "skipping non-test definition");
            continue;
        };
        let test_case = catalog.instantiate(&bean.path)?;
        definitions.push(TestCaseDefinition::new(bean.path, test_case, metadata));
    }
    Ok(definitions)
}
