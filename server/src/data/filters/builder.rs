//! SQL filter builder
//!
//! Binds compiled predicates against a [`FilterSchema`] and produces SQL
//! WHERE fragments with `?` placeholders, plus the [`SelectQuery`] the
//! fragments are conjoined onto.

use std::collections::BTreeSet;

use serde::Serialize;

use super::compiler::{LeafPredicate, Predicate, check_arity};
use super::error::FilterError;
use super::types::{CombinatorKind, Literal, Operator};

/// Field lookup for one filterable model
///
/// Implemented per entity. `field_names` includes computed fields, and
/// `resolve` maps every one of them to a SQL expression.
pub trait FilterSchema: Send + Sync {
    /// Model name used in error messages
    fn model(&self) -> &str;

    /// All names a filter may reference
    fn field_names(&self) -> BTreeSet<&str>;

    /// SQL expression for a field name
    fn resolve(&self, field: &str) -> Option<&str>;
}

/// Bound SQL parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl SqlValue {
    /// Scalar literal as a parameter (dates bind as ISO text)
    fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::String(s) => Some(Self::Text(s.clone())),
            Literal::Integer(i) => Some(Self::Integer(*i)),
            Literal::Float(f) => Some(Self::Real(*f)),
            Literal::Boolean(b) => Some(Self::Bool(*b)),
            Literal::Date(d) => Some(Self::Text(d.format("%Y-%m-%d").to_string())),
            Literal::List(_) => None,
        }
    }
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default)]
pub struct SqlParams {
    pub values: Vec<SqlValue>,
}

/// Schema-bound boolean condition: a WHERE fragment and its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCondition {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl SqlCondition {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// SELECT statement over a single table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    columns: Vec<String>,
    conditions: Vec<SqlCondition>,
    order_by: Option<String>,
    limit: Option<(u32, u32)>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            conditions: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Conjoin a condition with the ones already present
    pub fn and_where(mut self, condition: SqlCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Restrict to one page (1-based; page 0 is treated as page 1)
    pub fn paginate(mut self, page: u32, page_size: u32) -> Self {
        let offset = page.max(1).saturating_sub(1).saturating_mul(page_size);
        self.limit = Some((page_size, offset));
        self
    }

    pub fn conditions(&self) -> &[SqlCondition] {
        &self.conditions
    }

    /// Render SQL and the parameters in placeholder order
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
        let mut params = Vec::new();

        if !self.conditions.is_empty() {
            let clauses: Vec<&str> = self.conditions.iter().map(|c| c.sql.as_str()).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
            for condition in &self.conditions {
                params.extend(condition.params.iter().cloned());
            }
        }

        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if let Some((limit, offset)) = self.limit {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        (sql, params)
    }
}

/// Bind a predicate against a schema
///
/// All-or-nothing: an unknown field anywhere in the tree fails the whole bind.
pub fn bind(predicate: &Predicate, schema: &dyn FilterSchema) -> Result<SqlCondition, FilterError> {
    let mut params = SqlParams::default();
    let sql = bind_into(predicate, schema, &mut params)?;
    Ok(SqlCondition::new(sql, params.values))
}

/// Conjoin a predicate onto a query; `None` leaves the query unchanged
pub fn apply(
    query: SelectQuery,
    predicate: Option<&Predicate>,
    schema: &dyn FilterSchema,
) -> Result<SelectQuery, FilterError> {
    let Some(predicate) = predicate else {
        return Ok(query);
    };

    let condition = bind(predicate, schema)?;
    tracing::debug!(
        model = schema.model(),
        leaves = predicate.leaf_count(),
        condition = %condition.sql,
        "Applying filter"
    );
    Ok(query.and_where(condition))
}

fn bind_into(
    predicate: &Predicate,
    schema: &dyn FilterSchema,
    params: &mut SqlParams,
) -> Result<String, FilterError> {
    match predicate {
        Predicate::Leaf(leaf) => bind_leaf(leaf, schema, params),
        Predicate::Combinator(combinator) => {
            check_arity(combinator.kind, combinator.children.len())?;
            let parts = combinator
                .children
                .iter()
                .map(|child| bind_into(child, schema, params))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(match combinator.kind {
                CombinatorKind::And => format!("({})", parts.join(" AND ")),
                CombinatorKind::Or => format!("({})", parts.join(" OR ")),
                CombinatorKind::Not => format!("(NOT {})", parts.join("")),
            })
        }
    }
}

fn bind_leaf(
    leaf: &LeafPredicate,
    schema: &dyn FilterSchema,
    params: &mut SqlParams,
) -> Result<String, FilterError> {
    if !schema.field_names().contains(leaf.field.as_str()) {
        return Err(FilterError::unknown_field(&leaf.field, schema.model()));
    }
    let column = schema
        .resolve(&leaf.field)
        .ok_or_else(|| FilterError::unknown_field(&leaf.field, schema.model()))?;

    let invalid = |reason: &str| FilterError::InvalidValue {
        field: leaf.field.clone(),
        operator: leaf.operator.to_string(),
        reason: reason.to_string(),
    };

    if leaf.operator.is_unary() {
        let check = if leaf.operator == Operator::IsNull {
            "IS NULL"
        } else {
            "IS NOT NULL"
        };
        return Ok(format!("{} {}", column, check));
    }

    let value = leaf.value.as_ref().ok_or_else(|| FilterError::MissingValue {
        field: leaf.field.clone(),
        operator: leaf.operator.to_string(),
    })?;

    if leaf.operator.is_membership() {
        let Literal::List(items) = value else {
            return Err(invalid("expected a list value"));
        };

        if items.is_empty() {
            // Nothing is a member of the empty set
            return Ok(match leaf.operator {
                Operator::In => "1=0".to_string(),
                _ => "1=1".to_string(),
            });
        }

        let values = items
            .iter()
            .map(|item| {
                SqlValue::from_literal(item).ok_or_else(|| invalid("nested lists are not supported"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        params.values.extend(values);

        let keyword = if leaf.operator == Operator::In {
            "IN"
        } else {
            "NOT IN"
        };
        return Ok(format!("{} {} ({})", column, keyword, placeholders.join(", ")));
    }

    if value.is_list() {
        return Err(invalid("list values need `in` or `not_in`"));
    }

    let comparison = match leaf.operator {
        Operator::Eq => "=",
        Operator::Ne => "<>",
        Operator::Gt => ">",
        Operator::Ge => ">=",
        Operator::Lt => "<",
        Operator::Le => "<=",
        Operator::In | Operator::NotIn | Operator::IsNull | Operator::IsNotNull => {
            return Err(invalid("unsupported operator"));
        }
    };

    let value = SqlValue::from_literal(value)
        .ok_or_else(|| invalid("list values need `in` or `not_in`"))?;
    params.values.push(value);

    Ok(format!("{} {} ?", column, comparison))
}
