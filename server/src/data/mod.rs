//! Data storage layer
//!
//! - `filters` - Filter language: parsing, compilation and SQL binding
//! - `sqlite` - Transactional database for users and jogging records
//! - `types` - Row and input types shared by repositories and commands

pub mod filters;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteService;
