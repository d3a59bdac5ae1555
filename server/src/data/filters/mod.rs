//! Query filter system
//!
//! Textual boolean filters for list endpoints, e.g.
//! `(distance > 2500) or (weather == 'Rain')`. Three stages:
//! - `parser` - text to [`FilterSpec`] (no schema knowledge)
//! - `compiler` - [`FilterSpec`] to an arity-checked [`Predicate`]
//! - `builder` - binds a [`Predicate`] against a [`FilterSchema`] and
//!   conjoins the resulting condition onto a [`SelectQuery`]
//!
//! ## Usage
//!
//! ```no_run
//! use jogtrack::data::filters::{SelectQuery, columns, compile, parse, apply};
//!
//! let spec = parse(Some("(weather != 'Clouds') and (distance >= 6000)")).unwrap();
//! let predicate = spec.as_ref().map(compile).transpose().unwrap();
//! let query = SelectQuery::new("jogging_info", &["rid", "distance"]);
//! let query = apply(query, predicate.as_ref(), &columns::JOGGING).unwrap();
//! let (sql, params) = query.to_sql();
//! assert!(sql.contains("WHERE"));
//! assert_eq!(params.len(), 2);
//! ```

mod builder;
pub mod columns;
mod compiler;
mod error;
mod lexer;
mod parser;
mod types;

pub use builder::{FilterSchema, SelectQuery, SqlCondition, SqlParams, SqlValue, apply, bind};
pub use compiler::{CombinatorPredicate, LeafPredicate, Predicate, compile};
pub use error::FilterError;
pub use parser::{MAX_FILTER_LEN, MAX_NESTING_DEPTH, parse};
pub use types::{CombinatorKind, FilterSpec, Literal, Operator};

/// Compile an optional spec and conjoin it onto `query`
///
/// `None` is the no-filter case and returns `query` unchanged.
pub fn filter_query(
    query: SelectQuery,
    spec: Option<&FilterSpec>,
    schema: &dyn FilterSchema,
) -> Result<SelectQuery, FilterError> {
    let predicate = spec.map(compile).transpose()?;
    apply(query, predicate.as_ref(), schema)
}
