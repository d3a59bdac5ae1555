//! Weekly jogging report
//!
//! Totals one user's distance and time over a seven-day window. The window
//! is an ordinary `date >= start and date <= end` filter run through the
//! owner-scoped record listing.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::data::filters::FilterSpec;
use crate::data::sqlite::SqliteError;
use crate::data::sqlite::repositories::records_of_user_unpaged;
use crate::data::types::JoggingRow;

/// Days after `week_start` included in the report
const WEEK_SPAN_DAYS: u64 = 6;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Week starting {0} is out of range")]
    InvalidWeek(NaiveDate),
    #[error("Total {total} of {username} overflows")]
    TotalOverflow {
        username: String,
        total: &'static str,
    },
    #[error(transparent)]
    Storage(#[from] SqliteError),
}

/// Aggregated totals for one week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub username: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub runs: usize,
    /// Meters
    pub total_distance: i64,
    /// Minutes
    pub total_time: i64,
    /// Meters per minute, 0 when no time was logged
    pub speed: f64,
}

impl WeeklyReport {
    fn from_records(
        username: &str,
        week_start: NaiveDate,
        week_end: NaiveDate,
        records: &[JoggingRow],
    ) -> Result<Self, ReportError> {
        let total = |name: &'static str, value: fn(&JoggingRow) -> i64| {
            records
                .iter()
                .try_fold(0i64, |sum, r| sum.checked_add(value(r)))
                .ok_or_else(|| ReportError::TotalOverflow {
                    username: username.to_string(),
                    total: name,
                })
        };
        let total_distance = total("distance", |r| r.distance)?;
        let total_time = total("time", |r| r.time)?;
        let speed = if total_time == 0 {
            0.0
        } else {
            total_distance as f64 / total_time as f64
        };

        Ok(Self {
            username: username.to_string(),
            week_start,
            week_end,
            runs: records.len(),
            total_distance,
            total_time,
            speed,
        })
    }
}

fn week_end_of(week_start: NaiveDate) -> Result<NaiveDate, ReportError> {
    week_start
        .checked_add_days(Days::new(WEEK_SPAN_DAYS))
        .ok_or(ReportError::InvalidWeek(week_start))
}

/// Date-range filter covering `week_start` through six days later
pub fn week_filter(week_start: NaiveDate) -> Result<FilterSpec, ReportError> {
    let week_end = week_end_of(week_start)?;
    Ok(FilterSpec::and(vec![
        FilterSpec::leaf("date", ">=", week_start),
        FilterSpec::leaf("date", "<=", week_end),
    ]))
}

/// Build the report for `username` over the week starting at `week_start`
pub async fn weekly_report(
    pool: &SqlitePool,
    username: &str,
    week_start: NaiveDate,
) -> Result<WeeklyReport, ReportError> {
    let filter = week_filter(week_start)?;
    let week_end = week_end_of(week_start)?;

    let records = records_of_user_unpaged(pool, username, Some(&filter)).await?;
    let report = WeeklyReport::from_records(username, week_start, week_end, &records)?;

    tracing::debug!(
        %username,
        %week_start,
        runs = report.runs,
        total_distance = report.total_distance,
        total_time = report.total_time,
        "Built weekly report"
    );
    Ok(report)
}
