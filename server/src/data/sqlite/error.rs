//! SQLite error types

use thiserror::Error;

use crate::data::filters::FilterError;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid stored value in {column}: {value}")]
    InvalidData { column: &'static str, value: String },
}

impl SqliteError {
    /// Stable error code, delegating to the filter error when there is one
    pub fn code(&self) -> &'static str {
        match self {
            Self::Filter(e) => e.code(),
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) | Self::MigrationFailed { .. } | Self::InvalidData { .. } => {
                "DATABASE_ERROR"
            }
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// True when the caller supplied bad input rather than the store failing
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Filter(_) | Self::Conflict(_) | Self::NotFound(_))
    }
}
