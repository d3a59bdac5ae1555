//! Filter compilation
//!
//! Validates a [`FilterSpec`] into a [`Predicate`] tree: operator spellings
//! resolve to [`Operator`], binary operators carry a value and combinators
//! have a legal number of children. No schema is consulted here.

use super::error::FilterError;
use super::types::{CombinatorKind, FilterSpec, Literal, Operator};

/// Single field comparison
#[derive(Debug, Clone, PartialEq)]
pub struct LeafPredicate {
    pub field: String,
    pub operator: Operator,
    /// Always `Some` for binary operators, `None` for unary ones
    pub value: Option<Literal>,
}

/// Boolean combination of child predicates
#[derive(Debug, Clone, PartialEq)]
pub struct CombinatorPredicate {
    pub kind: CombinatorKind,
    pub children: Vec<Predicate>,
}

/// Compiled, arity-checked filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Leaf(LeafPredicate),
    Combinator(CombinatorPredicate),
}

impl Predicate {
    /// Number of leaf comparisons in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Combinator(c) => c.children.iter().map(Self::leaf_count).sum(),
        }
    }
}

/// Compile a filter specification
pub fn compile(spec: &FilterSpec) -> Result<Predicate, FilterError> {
    match spec {
        FilterSpec::Leaf { field, op, value } => {
            let operator: Operator = op.parse()?;

            let value = if operator.is_unary() {
                None
            } else {
                match value {
                    Some(v) => Some(v.clone()),
                    None => {
                        return Err(FilterError::MissingValue {
                            field: field.clone(),
                            operator: op.clone(),
                        });
                    }
                }
            };

            Ok(Predicate::Leaf(LeafPredicate {
                field: field.clone(),
                operator,
                value,
            }))
        }
        FilterSpec::Combinator { kind, children } => {
            check_arity(*kind, children.len())?;
            let children = children
                .iter()
                .map(compile)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::Combinator(CombinatorPredicate {
                kind: *kind,
                children,
            }))
        }
    }
}

/// Combinator child-count rule shared with the binder
pub(super) fn check_arity(kind: CombinatorKind, found: usize) -> Result<(), FilterError> {
    match kind {
        CombinatorKind::Not if found != 1 => Err(FilterError::InvalidArity {
            kind,
            expected: "exactly one",
            found,
        }),
        CombinatorKind::And | CombinatorKind::Or if found == 0 => Err(FilterError::InvalidArity {
            kind,
            expected: "one or more",
            found,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(field: &str, operator: Operator, value: impl Into<Literal>) -> Predicate {
        Predicate::Leaf(LeafPredicate {
            field: field.to_string(),
            operator,
            value: Some(value.into()),
        })
    }

    #[test]
    fn compiles_leaf_with_alias() {
        let spec = FilterSpec::leaf("distance", "gt", 2500);
        assert_eq!(compile(&spec).unwrap(), leaf("distance", Operator::Gt, 2500));
    }

    #[test]
    fn unknown_operator() {
        let spec = FilterSpec::leaf("distance", "like", 2500);
        assert_eq!(
            compile(&spec).unwrap_err(),
            FilterError::UnknownOperator("like".to_string())
        );
    }

    #[test]
    fn binary_operator_requires_value() {
        let spec = FilterSpec::unary("distance", ">");
        assert_eq!(
            compile(&spec).unwrap_err(),
            FilterError::MissingValue {
                field: "distance".to_string(),
                operator: ">".to_string(),
            }
        );
    }

    #[test]
    fn unary_operator_drops_value() {
        let spec = FilterSpec::leaf("weather", "is_null", "ignored");
        assert_eq!(
            compile(&spec).unwrap(),
            Predicate::Leaf(LeafPredicate {
                field: "weather".to_string(),
                operator: Operator::IsNull,
                value: None,
            })
        );
    }

    #[test]
    fn compiles_binary_combinator() {
        let spec = FilterSpec::or(vec![
            FilterSpec::leaf("distance", ">", 20),
            FilterSpec::leaf("distance", "<", 10),
        ]);
        let predicate = compile(&spec).unwrap();
        assert_eq!(
            predicate,
            Predicate::Combinator(CombinatorPredicate {
                kind: CombinatorKind::Or,
                children: vec![
                    leaf("distance", Operator::Gt, 20),
                    leaf("distance", Operator::Lt, 10),
                ],
            })
        );
        assert_eq!(predicate.leaf_count(), 2);
    }

    #[test]
    fn compiles_ternary_combinator() {
        let spec = FilterSpec::and(vec![
            FilterSpec::leaf("distance", ">=", 1000),
            FilterSpec::leaf("time", "<", 60),
            FilterSpec::leaf("weather", "==", "Clear"),
        ]);
        let Predicate::Combinator(c) = compile(&spec).unwrap() else {
            panic!("expected combinator");
        };
        assert_eq!(c.kind, CombinatorKind::And);
        assert_eq!(c.children.len(), 3);
    }

    #[test]
    fn single_child_and_is_allowed() {
        let spec = FilterSpec::and(vec![FilterSpec::leaf("time", "<", 60)]);
        assert!(compile(&spec).is_ok());
    }

    #[test]
    fn empty_and_is_invalid() {
        let spec = FilterSpec::and(vec![]);
        assert_eq!(
            compile(&spec).unwrap_err(),
            FilterError::InvalidArity {
                kind: CombinatorKind::And,
                expected: "one or more",
                found: 0,
            }
        );
    }

    #[test]
    fn not_requires_exactly_one_child() {
        let ok = FilterSpec::not(FilterSpec::leaf("weather", "==", "Rain"));
        assert!(compile(&ok).is_ok());

        let bad = FilterSpec::Combinator {
            kind: CombinatorKind::Not,
            children: vec![
                FilterSpec::leaf("weather", "==", "Rain"),
                FilterSpec::leaf("weather", "==", "Clear"),
            ],
        };
        assert_eq!(
            compile(&bad).unwrap_err(),
            FilterError::InvalidArity {
                kind: CombinatorKind::Not,
                expected: "exactly one",
                found: 2,
            }
        );
    }

    #[test]
    fn nested_error_fails_whole_tree() {
        let spec = FilterSpec::and(vec![
            FilterSpec::leaf("distance", ">", 20),
            FilterSpec::or(vec![
                FilterSpec::leaf("weather", "==", "Rain"),
                FilterSpec::leaf("weather", "~", "Clear"),
            ]),
        ]);
        assert_eq!(
            compile(&spec).unwrap_err(),
            FilterError::UnknownOperator("~".to_string())
        );
    }
}
