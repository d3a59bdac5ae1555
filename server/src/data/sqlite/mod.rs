//! SQLite database service
//!
//! Owns the connection pool for the jogging store. File databases run in WAL
//! mode with foreign keys on; `:memory:` gives a throwaway database shared by
//! every connection in the pool (used by tests and dry runs).

pub mod error;
mod migrations;
pub mod repositories;
pub mod schema;

pub use error::SqliteError;
pub use sqlx::SqlitePool;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::log::LevelFilter;

use crate::core::constants::{
    SQLITE_BUSY_TIMEOUT_SECS, SQLITE_CACHE_SIZE, SQLITE_IN_MEMORY, SQLITE_MAX_CONNECTIONS,
};

/// SQLite database service
///
/// Created once at startup; repositories borrow the pool.
pub struct SqliteService {
    pool: SqlitePool,
}

impl SqliteService {
    /// Open (creating if missing) the database at `path` and run migrations
    pub async fn init(path: &str) -> Result<Self, SqliteError> {
        let options = if path == SQLITE_IN_MEMORY {
            SqliteConnectOptions::from_str(SQLITE_IN_MEMORY)?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        let options = options
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
            .pragma("cache_size", SQLITE_CACHE_SIZE)
            .log_statements(LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        tracing::debug!(%path, "SqliteService initialized");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }
}
