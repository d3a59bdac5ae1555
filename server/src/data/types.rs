//! Row types shared by the repositories, reports and CLI output

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_USER_ROLE};

// ============================================================================
// User types
// ============================================================================

/// User row from database (credentials omitted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub username: String,
    pub forename: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub role: String,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    /// Plain text; hashed before storage
    pub password: String,
    pub forename: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub role: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            forename: None,
            surname: None,
            email: None,
            role: DEFAULT_USER_ROLE.to_string(),
        }
    }
}

/// Changes to an existing user; `None` keeps the stored value.
/// The username is the key and never changes.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// Plain text; hashed before storage
    pub password: Option<String>,
    pub forename: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

// ============================================================================
// Jogging types
// ============================================================================

/// Jogging record row. `distance` is in meters, `time` in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoggingRow {
    pub rid: i64,
    pub username: String,
    pub date: NaiveDate,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub distance: i64,
    pub time: i64,
    pub weather: Option<String>,
}

/// Input for creating a jogging record
#[derive(Debug, Clone)]
pub struct NewJoggingRecord {
    pub username: String,
    pub date: NaiveDate,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub distance: i64,
    pub time: i64,
    pub weather: Option<String>,
}

/// Changes to an existing record; `None` keeps the stored value.
/// `rid` and the owning username never change.
#[derive(Debug, Clone, Default)]
pub struct JoggingUpdate {
    pub date: Option<NaiveDate>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub distance: Option<i64>,
    pub time: Option<i64>,
    pub weather: Option<String>,
}

// ============================================================================
// Pagination
// ============================================================================

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
