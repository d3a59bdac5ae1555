//! Filterable models
//!
//! Static schemas for the tables filters run against. Each lists its stored
//! columns and any computed fields with the SQL expression backing them.

use std::collections::BTreeSet;

use super::builder::FilterSchema;

/// Schema for one table
#[derive(Debug, Clone, Copy)]
pub struct ModelSchema {
    pub model: &'static str,
    pub table: &'static str,
    /// Columns that may be filtered on
    pub columns: &'static [&'static str],
    /// Derived fields: (name, SQL expression)
    pub computed: &'static [(&'static str, &'static str)],
}

impl FilterSchema for ModelSchema {
    fn model(&self) -> &str {
        self.model
    }

    fn field_names(&self) -> BTreeSet<&str> {
        self.columns
            .iter()
            .copied()
            .chain(self.computed.iter().map(|(name, _)| *name))
            .collect()
    }

    fn resolve(&self, field: &str) -> Option<&str> {
        if let Some(column) = self.columns.iter().find(|c| **c == field) {
            return Some(*column);
        }
        self.computed
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, expr)| *expr)
    }
}

pub const JOGGING: ModelSchema = ModelSchema {
    model: "JoggingInfo",
    table: "jogging_info",
    columns: &[
        "rid", "username", "date", "lat", "lon", "distance", "time", "weather",
    ],
    computed: &[("speed", "(CAST(distance AS REAL) / NULLIF(time, 0))")],
};

/// `password` and `token` are stored but never filterable
pub const USER: ModelSchema = ModelSchema {
    model: "UserInfo",
    table: "user_info",
    columns: &["username", "forename", "surname", "email", "role"],
    computed: &[],
};
