//! User repository for SQLite operations

use sqlx::SqlitePool;

use super::fetch_all;
use crate::data::filters::{FilterSpec, SelectQuery, columns, filter_query};
use crate::data::sqlite::SqliteError;
use crate::data::types::{NewUser, Page, UserRow, UserUpdate};
use crate::utils::crypto::sha256_hex;

const USER_COLUMNS: &[&str] = &["username", "forename", "surname", "email", "role"];

type UserTuple = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

fn to_row((username, forename, surname, email, role): UserTuple) -> UserRow {
    UserRow {
        username,
        forename,
        surname,
        email,
        role,
    }
}

/// Create a user; the password is stored as a SHA-256 hex digest
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<UserRow, SqliteError> {
    let result = sqlx::query(
        "INSERT INTO user_info (username, password, forename, surname, email, role) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(sha256_hex(&user.password))
    .bind(&user.forename)
    .bind(&user.surname)
    .bind(&user.email)
    .bind(&user.role)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(SqliteError::Conflict(format!(
                "User {} already exists",
                user.username
            )));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::debug!(username = %user.username, role = %user.role, "Created user");

    Ok(UserRow {
        username: user.username.clone(),
        forename: user.forename.clone(),
        surname: user.surname.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
    })
}

/// Get a user by username
pub async fn get_user(pool: &SqlitePool, username: &str) -> Result<Option<UserRow>, SqliteError> {
    let row = sqlx::query_as::<_, UserTuple>(
        "SELECT username, forename, surname, email, role FROM user_info WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(to_row))
}

/// Apply `changes` to an existing user and return the stored row
pub async fn update_user(
    pool: &SqlitePool,
    username: &str,
    changes: &UserUpdate,
) -> Result<UserRow, SqliteError> {
    let result = sqlx::query(
        r#"
        UPDATE user_info SET
            password = COALESCE(?, password),
            forename = COALESCE(?, forename),
            surname = COALESCE(?, surname),
            email = COALESCE(?, email),
            role = COALESCE(?, role)
        WHERE username = ?
        "#,
    )
    .bind(changes.password.as_deref().map(sha256_hex))
    .bind(&changes.forename)
    .bind(&changes.surname)
    .bind(&changes.email)
    .bind(&changes.role)
    .bind(username)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(SqliteError::NotFound(format!("User {}", username)));
    }

    tracing::debug!(%username, "Updated user");

    get_user(pool, username)
        .await?
        .ok_or_else(|| SqliteError::NotFound(format!("User {}", username)))
}

/// Delete a user that owns no records
pub async fn delete_user(pool: &SqlitePool, username: &str) -> Result<(), SqliteError> {
    let result = sqlx::query("DELETE FROM user_info WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await;

    let result = match result {
        Ok(result) => result,
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
            return Err(SqliteError::Conflict(format!(
                "User {} still has records",
                username
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if result.rows_affected() == 0 {
        return Err(SqliteError::NotFound(format!("User {}", username)));
    }

    tracing::debug!(%username, "Deleted user");
    Ok(())
}

/// List users matching an optional filter, one page at a time
pub async fn list_users(
    pool: &SqlitePool,
    filter: Option<&FilterSpec>,
    page: Page,
) -> Result<Vec<UserRow>, SqliteError> {
    let query = SelectQuery::new(columns::USER.table, USER_COLUMNS).order_by("username");
    let query = filter_query(query, filter, &columns::USER)?.paginate(page.page, page.page_size);

    let rows = fetch_all::<UserTuple>(pool, &query).await?;
    tracing::debug!(count = rows.len(), page = page.page, "Listed users");
    Ok(rows.into_iter().map(to_row).collect())
}
