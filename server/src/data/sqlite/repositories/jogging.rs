//! Jogging record repository for SQLite operations
//!
//! Owner-scoped listings conjoin `username == <owner>` with the caller's
//! filter before compilation, so a caller filter can only narrow the owner's
//! records.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::fetch_all;
use crate::core::constants::DATE_FORMAT;
use crate::data::filters::{FilterSpec, SelectQuery, columns, filter_query};
use crate::data::sqlite::SqliteError;
use crate::data::types::{JoggingRow, JoggingUpdate, NewJoggingRecord, Page};

const JOGGING_COLUMNS: &[&str] = &[
    "rid", "username", "date", "lat", "lon", "distance", "time", "weather",
];

type JoggingTuple = (
    i64,
    String,
    String,
    Option<f64>,
    Option<f64>,
    i64,
    i64,
    Option<String>,
);

fn to_row(
    (rid, username, date, lat, lon, distance, time, weather): JoggingTuple,
) -> Result<JoggingRow, SqliteError> {
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|_| {
        SqliteError::InvalidData {
            column: "jogging_info.date",
            value: date.clone(),
        }
    })?;

    Ok(JoggingRow {
        rid,
        username,
        date,
        lat,
        lon,
        distance,
        time,
        weather,
    })
}

/// Combine the owner leaf with an optional caller filter
fn owner_filter(username: &str, filter: Option<&FilterSpec>) -> FilterSpec {
    let owner = FilterSpec::leaf("username", "==", username);
    match filter {
        Some(filter) => FilterSpec::and(vec![owner, filter.clone()]),
        None => owner,
    }
}

fn base_query() -> SelectQuery {
    SelectQuery::new(columns::JOGGING.table, JOGGING_COLUMNS).order_by("rid")
}

async fn run(pool: &SqlitePool, query: &SelectQuery) -> Result<Vec<JoggingRow>, SqliteError> {
    fetch_all::<JoggingTuple>(pool, query)
        .await?
        .into_iter()
        .map(to_row)
        .collect()
}

/// Insert a record for an existing user
pub async fn create_record(
    pool: &SqlitePool,
    record: &NewJoggingRecord,
) -> Result<JoggingRow, SqliteError> {
    let date = record.date.format(DATE_FORMAT).to_string();

    let result = sqlx::query(
        "INSERT INTO jogging_info (username, date, lat, lon, distance, time, weather) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.username)
    .bind(&date)
    .bind(record.lat)
    .bind(record.lon)
    .bind(record.distance)
    .bind(record.time)
    .bind(&record.weather)
    .execute(pool)
    .await;

    let rid = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
            return Err(SqliteError::Conflict(format!(
                "Can not create record for unknown user {}",
                record.username
            )));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(rid, username = %record.username, %date, "Created jogging record");

    Ok(JoggingRow {
        rid,
        username: record.username.clone(),
        date: record.date,
        lat: record.lat,
        lon: record.lon,
        distance: record.distance,
        time: record.time,
        weather: record.weather.clone(),
    })
}

/// Get a record by id
pub async fn get_record(pool: &SqlitePool, rid: i64) -> Result<Option<JoggingRow>, SqliteError> {
    let row = sqlx::query_as::<_, JoggingTuple>(
        "SELECT rid, username, date, lat, lon, distance, time, weather FROM jogging_info WHERE rid = ?",
    )
    .bind(rid)
    .fetch_optional(pool)
    .await?;

    row.map(to_row).transpose()
}

/// Apply `changes` to an existing record and return the stored row
pub async fn update_record(
    pool: &SqlitePool,
    rid: i64,
    changes: &JoggingUpdate,
) -> Result<JoggingRow, SqliteError> {
    let result = sqlx::query(
        r#"
        UPDATE jogging_info SET
            date = COALESCE(?, date),
            lat = COALESCE(?, lat),
            lon = COALESCE(?, lon),
            distance = COALESCE(?, distance),
            time = COALESCE(?, time),
            weather = COALESCE(?, weather)
        WHERE rid = ?
        "#,
    )
    .bind(changes.date.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(changes.lat)
    .bind(changes.lon)
    .bind(changes.distance)
    .bind(changes.time)
    .bind(&changes.weather)
    .bind(rid)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(SqliteError::NotFound(format!("Record {}", rid)));
    }

    tracing::debug!(rid, "Updated jogging record");

    get_record(pool, rid)
        .await?
        .ok_or_else(|| SqliteError::NotFound(format!("Record {}", rid)))
}

/// Delete a record by id
pub async fn delete_record(pool: &SqlitePool, rid: i64) -> Result<(), SqliteError> {
    let result = sqlx::query("DELETE FROM jogging_info WHERE rid = ?")
        .bind(rid)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(SqliteError::NotFound(format!("Record {}", rid)));
    }

    tracing::debug!(rid, "Deleted jogging record");
    Ok(())
}

/// List records of every user matching an optional filter
pub async fn list_records(
    pool: &SqlitePool,
    filter: Option<&FilterSpec>,
    page: Page,
) -> Result<Vec<JoggingRow>, SqliteError> {
    let query = filter_query(base_query(), filter, &columns::JOGGING)?
        .paginate(page.page, page.page_size);
    let rows = run(pool, &query).await?;
    tracing::debug!(count = rows.len(), page = page.page, "Listed jogging records");
    Ok(rows)
}

/// List one user's records matching an optional filter
pub async fn list_records_of_user(
    pool: &SqlitePool,
    username: &str,
    filter: Option<&FilterSpec>,
    page: Page,
) -> Result<Vec<JoggingRow>, SqliteError> {
    let spec = owner_filter(username, filter);
    let query = filter_query(base_query(), Some(&spec), &columns::JOGGING)?
        .paginate(page.page, page.page_size);
    let rows = run(pool, &query).await?;
    tracing::debug!(%username, count = rows.len(), page = page.page, "Listed user records");
    Ok(rows)
}

/// All of one user's records matching an optional filter, without paging
pub async fn records_of_user_unpaged(
    pool: &SqlitePool,
    username: &str,
    filter: Option<&FilterSpec>,
) -> Result<Vec<JoggingRow>, SqliteError> {
    let spec = owner_filter(username, filter);
    let query = filter_query(base_query(), Some(&spec), &columns::JOGGING)?;
    run(pool, &query).await
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::fixtures::{RECORDS, seeded};
    use super::*;
    use crate::data::filters::{FilterError, parse};
    use crate::data::sqlite::SqliteService;

    fn spec(text: &str) -> Option<FilterSpec> {
        parse(Some(text)).unwrap()
    }

    fn rids(rows: &[JoggingRow]) -> BTreeSet<i64> {
        rows.iter().map(|r| r.rid).collect()
    }

    async fn all(pool: &SqlitePool, filter: Option<&FilterSpec>) -> Vec<JoggingRow> {
        list_records(pool, filter, Page::new(1, 100)).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_record_round_trips_date() {
        let service = seeded(&RECORDS[..1]).await;
        let rows = all(service.pool(), None).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2020, 9, 23).unwrap());
        assert_eq!(rows[0].weather.as_deref(), Some("Clouds"));
    }

    #[tokio::test]
    async fn test_create_record_for_unknown_user() {
        let service = seeded(&[]).await;
        let record = NewJoggingRecord {
            username: "ghost".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 9, 21).unwrap(),
            lat: None,
            lon: None,
            distance: 1000,
            time: 5,
            weather: None,
        };
        let err = create_record(service.pool(), &record).await.unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_end_to_end_filter_selects_second_row() {
        let service = seeded(&RECORDS[..2]).await;
        let filter = spec("(weather != 'Clouds') and (distance >= 6000)");
        let rows = all(service.pool(), filter.as_ref()).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].distance, 8251);
        assert_eq!(rows[0].weather.as_deref(), Some("Clear"));
    }

    #[tokio::test]
    async fn test_or_filter() {
        let service = seeded(RECORDS).await;
        let filter = spec("(distance > 9000) or (distance < 3500)");
        let distances: BTreeSet<i64> = all(service.pool(), filter.as_ref())
            .await
            .iter()
            .map(|r| r.distance)
            .collect();
        assert_eq!(distances, BTreeSet::from([9369, 3223]));
    }

    #[tokio::test]
    async fn test_date_filter() {
        let service = seeded(RECORDS).await;
        let filter = spec("(date >= '2020-09-24') and (date <= '2020-09-24')");
        let rows = all(service.pool(), filter.as_ref()).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.date.to_string() == "2020-09-24"));
    }

    #[tokio::test]
    async fn test_computed_speed_filter() {
        let service = seeded(RECORDS).await;
        // 8251 / 10 and 7572 / 7 are the only runs above 800 m/min
        let filter = spec("speed > 800");
        let distances: BTreeSet<i64> = all(service.pool(), filter.as_ref())
            .await
            .iter()
            .map(|r| r.distance)
            .collect();
        assert_eq!(distances, BTreeSet::from([8251, 7572]));
    }

    #[tokio::test]
    async fn test_conjunction_narrows_result() {
        let service = seeded(RECORDS).await;
        let pool = service.pool();

        let l1 = FilterSpec::leaf("weather", "==", "Clouds");
        let l2 = FilterSpec::leaf("distance", ">", 7000);
        let both = FilterSpec::and(vec![l1.clone(), l2]);

        let wide = rids(&all(pool, Some(&l1)).await);
        let narrow = rids(&all(pool, Some(&both)).await);
        assert!(narrow.is_subset(&wide));
        assert!(narrow.len() < wide.len());
    }

    #[tokio::test]
    async fn test_same_filter_selects_same_rows() {
        let service = seeded(RECORDS).await;
        let filter = spec("(weather in ['Rain', 'Clear']) and (time < 40)");
        let a = all(service.pool(), filter.as_ref()).await;
        let b = all(service.pool(), filter.as_ref()).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_unknown_field_fails_whole_query() {
        let service = seeded(RECORDS).await;
        let filter = spec("(distance > 1) and (bogus == 1)");
        let err = list_records(service.pool(), filter.as_ref(), Page::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SqliteError::Filter(FilterError::UnknownField { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_records_of_user_is_owner_scoped() {
        let service = seeded(RECORDS).await;
        let pool = service.pool();

        let rows = list_records_of_user(pool, "tonyfoltz", None, Page::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.username == "tonyfoltz"));

        // Caller filter cannot widen past the owner
        let filter = spec("(username == 'jeffreywood') or (distance > 0)");
        let rows = list_records_of_user(pool, "tonyfoltz", filter.as_ref(), Page::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.username == "tonyfoltz"));

        let filter = spec("weather == 'Clear'");
        let rows = list_records_of_user(pool, "tonyfoltz", filter.as_ref(), Page::default())
            .await
            .unwrap();
        assert_eq!(
            rows.iter().map(|r| r.distance).collect::<Vec<_>>(),
            vec![3979, 8743]
        );
    }

    #[tokio::test]
    async fn test_pagination_orders_by_rid() {
        let service = seeded(RECORDS).await;
        let pool = service.pool();

        let first = list_records(pool, None, Page::new(1, 4)).await.unwrap();
        let third = list_records(pool, None, Page::new(3, 4)).await.unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(third.len(), 2);
        assert!(first.windows(2).all(|w| w[0].rid < w[1].rid));
        assert!(first.last().unwrap().rid < third[0].rid);
    }

    #[tokio::test]
    async fn test_unpaged_returns_every_match() {
        let service = seeded(RECORDS).await;
        let rows = records_of_user_unpaged(service.pool(), "jeffreywood", None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 6);

        let rows = records_of_user_unpaged(service.pool(), "antoniasimcox", None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    /// Seed rows plus one run logged without coordinates or weather
    async fn seeded_with_unknown_weather() -> (SqliteService, i64) {
        let service = seeded(RECORDS).await;
        let record = NewJoggingRecord {
            username: "jeffreywood".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 9, 26).unwrap(),
            lat: None,
            lon: None,
            distance: 4000,
            time: 20,
            weather: None,
        };
        let row = create_record(service.pool(), &record).await.unwrap();
        (service, row.rid)
    }

    fn distances(rows: &[JoggingRow]) -> BTreeSet<i64> {
        rows.iter().map(|r| r.distance).collect()
    }

    #[tokio::test]
    async fn test_not_filter_skips_unknown_weather() {
        let (service, _) = seeded_with_unknown_weather().await;
        let filter = FilterSpec::not(FilterSpec::leaf("weather", "==", "Rain"));
        let rows = all(service.pool(), Some(&filter)).await;
        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|r| r.weather.as_deref() != Some("Rain")));
        assert!(rows.iter().all(|r| r.weather.is_some()));
    }

    #[tokio::test]
    async fn test_not_in_filter() {
        let (service, _) = seeded_with_unknown_weather().await;
        let filter = spec("weather not_in ['Rain', 'Clouds']");
        let rows = all(service.pool(), filter.as_ref()).await;
        assert_eq!(distances(&rows), BTreeSet::from([8251, 3979, 8743]));
    }

    #[tokio::test]
    async fn test_null_filters() {
        let (service, rid) = seeded_with_unknown_weather().await;
        let pool = service.pool();

        let rows = all(pool, spec("weather is_null").as_ref()).await;
        assert_eq!(rids(&rows), BTreeSet::from([rid]));

        let rows = all(pool, spec("lat is_null").as_ref()).await;
        assert_eq!(rids(&rows), BTreeSet::from([rid]));

        let rows = all(pool, spec("weather is_not_null").as_ref()).await;
        assert_eq!(rows.len(), RECORDS.len());
        assert!(!rids(&rows).contains(&rid));
    }

    #[tokio::test]
    async fn test_update_record_keeps_owner_and_unset_fields() {
        let service = seeded(&RECORDS[..2]).await;
        let pool = service.pool();
        let before = all(pool, None).await.remove(1);

        let changes = JoggingUpdate {
            distance: Some(9000),
            weather: Some("Rain".to_string()),
            ..Default::default()
        };
        let after = update_record(pool, before.rid, &changes).await.unwrap();

        assert_eq!(after.rid, before.rid);
        assert_eq!(after.username, "jeffreywood");
        assert_eq!(after.distance, 9000);
        assert_eq!(after.weather.as_deref(), Some("Rain"));
        assert_eq!(after.date, before.date);
        assert_eq!(after.time, before.time);
        assert_eq!(get_record(pool, before.rid).await.unwrap(), Some(after));
    }

    #[tokio::test]
    async fn test_update_record_date() {
        let service = seeded(&RECORDS[..1]).await;
        let pool = service.pool();
        let rid = all(pool, None).await[0].rid;

        let changes = JoggingUpdate {
            date: NaiveDate::from_ymd_opt(2020, 10, 1),
            ..Default::default()
        };
        update_record(pool, rid, &changes).await.unwrap();

        let rows = all(pool, spec("date == '2020-10-01'").as_ref()).await;
        assert_eq!(rids(&rows), BTreeSet::from([rid]));
    }

    #[tokio::test]
    async fn test_update_unknown_record_is_not_found() {
        let service = seeded(&RECORDS[..1]).await;
        let err = update_record(service.pool(), 999, &JoggingUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_record() {
        let service = seeded(&RECORDS[..3]).await;
        let pool = service.pool();
        let rid = all(pool, None).await[0].rid;

        delete_record(pool, rid).await.unwrap();
        assert!(get_record(pool, rid).await.unwrap().is_none());
        assert_eq!(all(pool, None).await.len(), 2);

        let err = delete_record(pool, rid).await.unwrap_err();
        assert!(matches!(err, SqliteError::NotFound(_)));
    }
}
