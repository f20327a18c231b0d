//! Store operations.
//!
//! Writes that affect visible data run inside a transaction and announce a
//! [`DataChange`] only after commit, so an open reader either sees the full
//! pre-write row set or the full post-write set, never a mix. Deletes that
//! touch zero rows are not announced.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::changes::{ChangeNotifier, DataChange};
use super::models::{ForecastDay, Location, Photo};
use crate::helpers::previous_day;

/// Parameters for one forecast-day row in a bulk replace.
pub struct InsertForecastDayParams {
    pub day: NaiveDate,
    pub weather_code: i32,
    pub short_desc: String,
    pub long_desc: String,
    pub max_temp_c: Decimal,
    pub min_temp_c: Decimal,
    pub current_temp_c: Option<Decimal>,
    pub humidity_pct: Decimal,
    pub pressure_hpa: Decimal,
    pub wind_speed_ms: Option<Decimal>,
    pub wind_direction_deg: Option<Decimal>,
    pub cloudiness_pct: Option<Decimal>,
}

/// Parameters for one photo row in a bulk replace.
pub struct InsertPhotoParams {
    pub url: String,
    pub title: String,
    pub owner: String,
    pub taken_on: String,
}

/// Resolve the location row for a query string, creating it on first contact.
///
/// Idempotent: repeated calls with the same `input_name` return the same id.
/// An existing row only gets its coordinates corrected from the latest
/// payload; `display_name` is written once and never mutated after that.
pub async fn resolve_or_create_location(
    pool: &PgPool,
    notifier: &ChangeNotifier,
    input_name: &str,
    display_name: &str,
    latitude: Decimal,
    longitude: Decimal,
) -> Result<Uuid, sqlx::Error> {
    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM locations WHERE input_name = $1")
            .bind(input_name)
            .fetch_optional(pool)
            .await?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO locations (id, input_name, display_name, latitude, longitude, created_at)
         VALUES ($1, $2, $3, $4, $5, NOW())
         ON CONFLICT (input_name) DO UPDATE
             SET latitude = EXCLUDED.latitude,
                 longitude = EXCLUDED.longitude
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(input_name)
    .bind(display_name)
    .bind(latitude)
    .bind(longitude)
    .fetch_one(pool)
    .await?;

    // Only first contact changes the tracked set.
    if existing.is_none() {
        notifier.notify(DataChange::Locations);
    }

    Ok(id)
}

/// Replace a location's forecast window in one atomic unit.
///
/// Clears the incoming batch's day range, inserts the new batch, and prunes
/// rows older than the day before `as_of` (the rolling window keeps
/// "yesterday" but nothing earlier). Readers mid-transaction observe the
/// full old window or the full new one.
pub async fn replace_forecast_days(
    pool: &PgPool,
    notifier: &ChangeNotifier,
    input_name: &str,
    location_id: Uuid,
    as_of: NaiveDate,
    fetched_at: DateTime<Utc>,
    days: &[InsertForecastDayParams],
) -> Result<u64, sqlx::Error> {
    if days.is_empty() {
        return Ok(0);
    }

    let first_day = days
        .iter()
        .map(|d| d.day)
        .min()
        .unwrap_or(as_of);

    let mut tx = pool.begin().await?;

    // The batch replaces, never patches: clear its whole day range first so
    // the (location_id, day) uniqueness constraint cannot fire.
    sqlx::query("DELETE FROM forecast_days WHERE location_id = $1 AND day >= $2")
        .bind(location_id)
        .bind(first_day)
        .execute(&mut *tx)
        .await?;

    for d in days {
        sqlx::query(
            "INSERT INTO forecast_days (
                id, location_id, day, weather_code, short_desc, long_desc,
                max_temp_c, min_temp_c, current_temp_c,
                humidity_pct, pressure_hpa,
                wind_speed_ms, wind_direction_deg, cloudiness_pct, fetched_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11, $12, $13, $14, $15
            )",
        )
        .bind(Uuid::new_v4())
        .bind(location_id)
        .bind(d.day)
        .bind(d.weather_code)
        .bind(&d.short_desc)
        .bind(&d.long_desc)
        .bind(d.max_temp_c)
        .bind(d.min_temp_c)
        .bind(d.current_temp_c)
        .bind(d.humidity_pct)
        .bind(d.pressure_hpa)
        .bind(d.wind_speed_ms)
        .bind(d.wind_direction_deg)
        .bind(d.cloudiness_pct)
        .bind(fetched_at)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM forecast_days WHERE location_id = $1 AND day < $2")
        .bind(location_id)
        .bind(previous_day(as_of))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    notifier.notify(DataChange::Forecasts {
        input_name: input_name.to_string(),
    });

    Ok(days.len() as u64)
}

/// Replace a location's photo set (delete-all-then-insert, atomic).
///
/// The incoming set's size is denormalized onto every inserted row.
pub async fn replace_photos(
    pool: &PgPool,
    notifier: &ChangeNotifier,
    input_name: &str,
    location_id: Uuid,
    photos: &[InsertPhotoParams],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM photos WHERE location_id = $1")
        .bind(location_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let total_count = photos.len() as i32;
    for p in photos {
        sqlx::query(
            "INSERT INTO photos (id, location_id, url, title, owner, taken_on, total_count, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())",
        )
        .bind(Uuid::new_v4())
        .bind(location_id)
        .bind(&p.url)
        .bind(&p.title)
        .bind(&p.owner)
        .bind(&p.taken_on)
        .bind(total_count)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    if deleted > 0 || !photos.is_empty() {
        notifier.notify(DataChange::Photos {
            input_name: input_name.to_string(),
        });
    }

    Ok(photos.len() as u64)
}

/// Look up a tracked location by its query string.
pub async fn get_location(
    pool: &PgPool,
    input_name: &str,
) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "SELECT id, input_name, display_name, latitude, longitude, created_at
         FROM locations WHERE input_name = $1",
    )
    .bind(input_name)
    .fetch_optional(pool)
    .await
}

/// All tracked locations, ordered by query string.
pub async fn list_locations(pool: &PgPool) -> Result<Vec<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "SELECT id, input_name, display_name, latitude, longitude, created_at
         FROM locations ORDER BY input_name",
    )
    .fetch_all(pool)
    .await
}

/// Query strings of all tracked locations (batch-sync targets).
pub async fn list_tracked_input_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT input_name FROM locations ORDER BY input_name")
        .fetch_all(pool)
        .await
}

/// Forecast days for a location from `from_day` onwards, ascending by day.
pub async fn get_forecast_days_from(
    pool: &PgPool,
    input_name: &str,
    from_day: NaiveDate,
) -> Result<Vec<ForecastDay>, sqlx::Error> {
    sqlx::query_as::<_, ForecastDay>(
        "SELECT f.id, f.location_id, f.day, f.weather_code, f.short_desc, f.long_desc,
                f.max_temp_c, f.min_temp_c, f.current_temp_c,
                f.humidity_pct, f.pressure_hpa,
                f.wind_speed_ms, f.wind_direction_deg, f.cloudiness_pct, f.fetched_at
         FROM forecast_days f
         INNER JOIN locations l ON f.location_id = l.id
         WHERE l.input_name = $1 AND f.day >= $2
         ORDER BY f.day ASC",
    )
    .bind(input_name)
    .bind(from_day)
    .fetch_all(pool)
    .await
}

/// The single forecast day for a location and date, if present.
pub async fn get_forecast_day(
    pool: &PgPool,
    input_name: &str,
    day: NaiveDate,
) -> Result<Option<ForecastDay>, sqlx::Error> {
    sqlx::query_as::<_, ForecastDay>(
        "SELECT f.id, f.location_id, f.day, f.weather_code, f.short_desc, f.long_desc,
                f.max_temp_c, f.min_temp_c, f.current_temp_c,
                f.humidity_pct, f.pressure_hpa,
                f.wind_speed_ms, f.wind_direction_deg, f.cloudiness_pct, f.fetched_at
         FROM forecast_days f
         INNER JOIN locations l ON f.location_id = l.id
         WHERE l.input_name = $1 AND f.day = $2",
    )
    .bind(input_name)
    .bind(day)
    .fetch_optional(pool)
    .await
}

/// The full photo set for a location. No defined order.
pub async fn get_photos(pool: &PgPool, input_name: &str) -> Result<Vec<Photo>, sqlx::Error> {
    sqlx::query_as::<_, Photo>(
        "SELECT p.id, p.location_id, p.url, p.title, p.owner, p.taken_on, p.total_count, p.created_at
         FROM photos p
         INNER JOIN locations l ON p.location_id = l.id
         WHERE l.input_name = $1",
    )
    .bind(input_name)
    .fetch_all(pool)
    .await
}

/// Stop tracking a location. Cascades to its forecast and photo rows.
/// Returns the number of location rows removed (0 or 1).
pub async fn delete_location(
    pool: &PgPool,
    notifier: &ChangeNotifier,
    input_name: &str,
) -> Result<u64, sqlx::Error> {
    let deleted = sqlx::query("DELETE FROM locations WHERE input_name = $1")
        .bind(input_name)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted > 0 {
        notifier.notify(DataChange::Locations);
    }

    Ok(deleted)
}
