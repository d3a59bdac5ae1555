//! Filter type definitions
//!
//! Defines the schema-agnostic filter specification produced by the parser:
//! literal values, the closed operator set and the combinator kinds.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Literal value on the right-hand side of a leaf comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    List(Vec<Literal>),
}

impl Literal {
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for Literal {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{}'", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "'{}'", d.format("%Y-%m-%d")),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::IsNotNull,
    ];

    /// Accepted spellings; the first one is canonical
    pub fn spellings(&self) -> &'static [&'static str] {
        match self {
            Self::Eq => &["==", "eq"],
            Self::Ne => &["!=", "ne"],
            Self::Gt => &[">", "gt"],
            Self::Ge => &[">=", "ge"],
            Self::Lt => &["<", "lt"],
            Self::Le => &["<=", "le"],
            Self::In => &["in"],
            Self::NotIn => &["not_in"],
            Self::IsNull => &["is_null"],
            Self::IsNotNull => &["is_not_null"],
        }
    }

    pub fn canonical(&self) -> &'static str {
        self.spellings()[0]
    }

    pub fn from_spelling(spelling: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.spellings().contains(&spelling))
    }

    /// Number of operands, counting the field itself
    pub fn arity(&self) -> usize {
        match self {
            Self::IsNull | Self::IsNotNull => 1,
            _ => 2,
        }
    }

    pub fn is_unary(&self) -> bool {
        self.arity() == 1
    }

    pub fn is_membership(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_spelling(s).ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Boolean combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinatorKind {
    And,
    Or,
    Not,
}

impl CombinatorKind {
    /// Infix keyword accepted by the textual grammar (`not` has no spelling)
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for CombinatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parsed filter tree, before any validation
///
/// `Leaf` keeps the operator as written so programmatic callers can hand in
/// specifications the compiler will reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum FilterSpec {
    Leaf {
        field: String,
        op: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Literal>,
    },
    Combinator {
        kind: CombinatorKind,
        children: Vec<FilterSpec>,
    },
}

impl FilterSpec {
    pub fn leaf(field: impl Into<String>, op: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::Leaf {
            field: field.into(),
            op: op.into(),
            value: Some(value.into()),
        }
    }

    /// Leaf without a value (for unary operators)
    pub fn unary(field: impl Into<String>, op: impl Into<String>) -> Self {
        Self::Leaf {
            field: field.into(),
            op: op.into(),
            value: None,
        }
    }

    pub fn and(children: Vec<FilterSpec>) -> Self {
        Self::Combinator {
            kind: CombinatorKind::And,
            children,
        }
    }

    pub fn or(children: Vec<FilterSpec>) -> Self {
        Self::Combinator {
            kind: CombinatorKind::Or,
            children,
        }
    }

    pub fn not(child: FilterSpec) -> Self {
        Self::Combinator {
            kind: CombinatorKind::Not,
            children: vec![child],
        }
    }

    /// Nesting depth (a single leaf is 1)
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Combinator { children, .. } => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }
}
