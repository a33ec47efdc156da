// crates/sponsormatch-core/src/filters.rs
// ============================================================================
// Module: Targeting Filter Algebra
// Description: The typed field-predicate algebra consumed by a vector index
//   adapter.
// Purpose: Give the targeting engine and the index adapter a shared,
//   unambiguous vocabulary for "what this query must and must not match".
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A filter expression is two ordered sequences of field predicates: `must`
//! (all must hold) and `must_not` (none may hold). Predicates carry a field
//! name, an operator, and a scalar-or-list value.
//!
//! Invariants:
//! - Empty expressions are valid and mean "no filter".
//! - `equals`/`any_of` are positive containment; `not_equals`/`not_in` are
//!   their negations.
//! - `all_of` requires the payload list to contain every listed value. An
//!   adapter that cannot express true all-of MUST reject the predicate
//!   rather than silently downgrade to any-of semantics.

use serde::Deserialize;
use serde::Serialize;

/// A predicate operator over a catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Scalar equality.
    Equals,
    /// Payload field is a list containing at least one of the given values.
    AnyOf,
    /// Payload field is a list containing every one of the given values.
    AllOf,
    /// Negation of [`FilterOp::Equals`].
    NotEquals,
    /// Negation of [`FilterOp::AnyOf`] (none of the given values are present).
    NotIn,
}

/// A scalar or list value carried by a [`FieldFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single string value, used with [`FilterOp::Equals`] / [`FilterOp::NotEquals`].
    Scalar(String),
    /// A list of string values, used with every other operator.
    List(Vec<String>),
}

impl FilterValue {
    /// Returns the value as a slice regardless of scalar/list shape.
    #[must_use]
    pub fn as_slice(&self) -> Vec<&str> {
        match self {
            Self::Scalar(value) => vec![value.as_str()],
            Self::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// A single field predicate.
///
/// # Invariants
/// - `field` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// The catalog attribute this predicate constrains.
    pub field: String,
    /// The operator relating `field` to `value`.
    pub op: FilterOp,
    /// The scalar or list operand.
    pub value: FilterValue,
}

impl FieldFilter {
    /// Builds an `any_of` predicate over a list of values.
    #[must_use]
    pub fn any_of(field: impl Into<String>, values: Vec<String>) -> Self {
        Self { field: field.into(), op: FilterOp::AnyOf, value: FilterValue::List(values) }
    }

    /// Builds an `all_of` predicate over a list of values.
    #[must_use]
    pub fn all_of(field: impl Into<String>, values: Vec<String>) -> Self {
        Self { field: field.into(), op: FilterOp::AllOf, value: FilterValue::List(values) }
    }

    /// Builds a `not_in` predicate over a list of excluded values.
    #[must_use]
    pub fn not_in(field: impl Into<String>, values: Vec<String>) -> Self {
        Self { field: field.into(), op: FilterOp::NotIn, value: FilterValue::List(values) }
    }
}

/// A complete filter expression: conjunction of `must`, negated by `must_not`.
///
/// # Invariants
/// - An empty expression (`must` and `must_not` both empty) matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorFilter {
    /// Predicates that must all hold.
    pub must: Vec<FieldFilter>,
    /// Predicates that must all fail to hold.
    pub must_not: Vec<FieldFilter>,
}

impl VectorFilter {
    /// Returns true when this expression carries no predicates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_is_empty() {
        assert!(VectorFilter::default().is_empty());
    }

    #[test]
    fn non_empty_filter_is_not_empty() {
        let filter = VectorFilter {
            must: vec![FieldFilter::any_of("topics", vec!["sports".into()])],
            must_not: vec![],
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn filter_value_as_slice_handles_scalar_and_list() {
        assert_eq!(FilterValue::Scalar("a".into()).as_slice(), vec!["a"]);
        assert_eq!(FilterValue::List(vec!["a".into(), "b".into()]).as_slice(), vec!["a", "b"]);
    }
}
