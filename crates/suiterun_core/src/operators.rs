//! Comparison operator vocabulary.
//!
//! This module defines the canonical comparison operators accepted by [`crate::compare`] along with their
//! accepted spellings.
//!
//! ## Examples
//! ```rust
//! use suiterun_core::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("==="), Some(OperatorId::Eq));
//! assert_eq!(operators::as_str(OperatorId::LtEq), "<=");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Stable identifier for every comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Metadata for an operator.
///
/// `spellings[0]` is the canonical spelling used when rendering assertion messages.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spellings: &'static [&'static str],
    /// Whether the operator is an ordering comparison (needs `PartialOrd` semantics).
    pub is_relational: bool,
}

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    op(OperatorId::Eq, &["===", "=="], false),
    op(OperatorId::NotEq, &["!==", "!="], false),
    op(OperatorId::Lt, &["<"], true),
    op(OperatorId::LtEq, &["<="], true),
    op(OperatorId::Gt, &[">"], true),
    op(OperatorId::GtEq, &[">="], true),
];

/// Returned when a spelling does not name a known operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown comparison operator `{0}`")]
pub struct UnknownOperator(pub String);

/// Look up metadata for an operator id.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Resolve an operator spelling to its identifier.
///
/// ## Notes
/// - Matching is **case-sensitive**.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| {
            let spellings: &[&str] = o.spellings;
            spellings.contains(&spelling)
        })
        .map(|o| o.id)
}

/// Canonical spelling of an operator.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spellings[0]
}

impl OperatorId {
    /// Ordering comparisons are decided by `PartialOrd::partial_cmp`; the others by `PartialEq`.
    pub fn is_relational(self) -> bool {
        info_for(self).is_relational
    }
}

impl FromStr for OperatorId {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_str(s).ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(as_str(*self))
    }
}

const fn op(id: OperatorId, spellings: &'static [&'static str], is_relational: bool) -> OperatorInfo {
    OperatorInfo {
        id,
        spellings,
        is_relational,
    }
}
