//! SQLite schema definitions

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Users
-- =============================================================================
CREATE TABLE IF NOT EXISTS user_info (
    username TEXT PRIMARY KEY CHECK(length(username) >= 1),
    password TEXT NOT NULL,
    forename TEXT,
    surname TEXT,
    email TEXT,
    role TEXT NOT NULL DEFAULT 'user' CHECK(role IN ('admin', 'staff', 'user')),
    token TEXT NOT NULL DEFAULT ''
);

-- =============================================================================
-- 2. Jogging records (references users)
-- =============================================================================
CREATE TABLE IF NOT EXISTS jogging_info (
    rid INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL REFERENCES user_info(username),
    date TEXT NOT NULL CHECK(date GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]'),
    lat REAL,
    lon REAL,
    distance INTEGER NOT NULL CHECK(distance >= 0),
    time INTEGER NOT NULL CHECK(time >= 0),
    weather TEXT
);

CREATE INDEX IF NOT EXISTS idx_jogging_info_username_date ON jogging_info(username, date);
"#;
