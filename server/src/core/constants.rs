// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "JogTrack";

/// Application name in lowercase (for paths, identifiers and log targets)
pub const APP_NAME_LOWER: &str = "jogtrack";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".jogtrack";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "jogtrack.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "JOGTRACK_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "JOGTRACK_LOG";

/// Environment variable for the database path
pub const ENV_DB: &str = "JOGTRACK_DB";

/// Environment variable for the default page size
pub const ENV_PAGE_SIZE: &str = "JOGTRACK_PAGE_SIZE";

// =============================================================================
// SQLite Database
// =============================================================================

/// Default SQLite database path (relative to the working directory)
pub const DEFAULT_DB_PATH: &str = "jogtrack.db";

/// Path value selecting a throwaway in-memory database
pub const SQLITE_IN_MEMORY: &str = ":memory:";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -16000 = 16MB)
pub const SQLITE_CACHE_SIZE: &str = "-16000";

// =============================================================================
// Listing
// =============================================================================

/// First page number (pages are 1-based)
pub const DEFAULT_PAGE: u32 = 1;

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 1000;

// =============================================================================
// Records
// =============================================================================

/// Storage and display format for record dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Role given to users created without one
pub const DEFAULT_USER_ROLE: &str = "user";

/// Roles accepted by the user table
pub const USER_ROLES: &[&str] = &["admin", "staff", "user"];
