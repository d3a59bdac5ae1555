//! Filter error types

use thiserror::Error;

use super::types::CombinatorKind;

/// Errors raised while parsing, compiling or binding a filter.
///
/// Every variant is a client input defect. Nothing here is transient, so
/// callers report it and never retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Filter text could not be parsed
    #[error("Malformed filter expression `{fragment}`: {reason}")]
    MalformedExpression { fragment: String, reason: String },

    /// Operator spelling is not in the supported set
    #[error("Operator `{0}` not valid")]
    UnknownOperator(String),

    /// Binary operator given without a value
    #[error("`value` must be provided for operator `{operator}` on field `{field}`")]
    MissingValue { field: String, operator: String },

    /// Combinator with the wrong number of children
    #[error("`{kind}` must have {expected} argument(s), got {found}")]
    InvalidArity {
        kind: CombinatorKind,
        expected: &'static str,
        found: usize,
    },

    /// Field not present in the target schema
    #[error("Model {model} has no field `{field}`")]
    UnknownField { field: String, model: String },

    /// Value shape does not fit the operator
    #[error("Invalid value for `{field} {operator}`: {reason}")]
    InvalidValue {
        field: String,
        operator: String,
        reason: String,
    },
}

impl FilterError {
    pub fn malformed(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedExpression {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_field(field: impl Into<String>, model: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
            model: model.into(),
        }
    }

    /// Stable error code for reporting at the boundary layer
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedExpression { .. } => "MALFORMED_FILTER",
            Self::UnknownOperator(_) => "UNKNOWN_FILTER_OPERATOR",
            Self::MissingValue { .. } => "MISSING_FILTER_VALUE",
            Self::InvalidArity { .. } => "INVALID_FILTER_ARITY",
            Self::UnknownField { .. } => "INVALID_FILTER_FIELD",
            Self::InvalidValue { .. } => "INVALID_FILTER_VALUE",
        }
    }
}
