//! SQLite repositories
//!
//! Row types live in `crate::data::types`. List operations take an optional
//! [`FilterSpec`] and run it through the filter pipeline before querying.

pub mod jogging;
pub mod user;

pub use jogging::{
    create_record, delete_record, get_record, list_records, list_records_of_user,
    records_of_user_unpaged, update_record,
};
pub use user::{create_user, delete_user, get_user, list_users, update_user};

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;

use crate::data::filters::{SelectQuery, SqlValue};
use crate::data::sqlite::SqliteError;

/// Execute a built query, binding its parameters in placeholder order
async fn fetch_all<T>(pool: &SqlitePool, query: &SelectQuery) -> Result<Vec<T>, SqliteError>
where
    T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
{
    let (sql, params) = query.to_sql();
    tracing::trace!(%sql, params = params.len(), "Executing filtered query");

    let mut q = sqlx::query_as::<_, T>(&sql);
    for value in params {
        q = match value {
            SqlValue::Text(s) => q.bind(s),
            SqlValue::Integer(i) => q.bind(i),
            SqlValue::Real(f) => q.bind(f),
            SqlValue::Bool(b) => q.bind(b),
        };
    }
    Ok(q.fetch_all(pool).await?)
}

