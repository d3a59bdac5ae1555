//! Domain logic built on top of the data layer
//!
//! - `report` - weekly distance/time aggregation per user

pub mod report;

pub use report::{ReportError, WeeklyReport, weekly_report};
