use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// A place tracked for forecasts, created on the first successful sync for
/// its query string and deleted only when the user stops tracking it.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; some never read by the API layer
pub struct Location {
    pub id: Uuid,
    /// The user-facing query string this location is requested under. Unique.
    pub input_name: String,
    /// Canonical name returned by the weather provider
    /// ("Mountain View" rather than a postcode).
    pub display_name: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One calendar day's weather for one location.
///
/// At most one row exists per (location_id, day); a sync replaces a
/// location's whole window rather than patching individual days.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; some never read by the API layer
pub struct ForecastDay {
    pub id: Uuid,
    pub location_id: Uuid,
    /// Canonical day key (UTC calendar day).
    pub day: NaiveDate,
    /// Condition code from the provider's taxonomy; drives icon selection.
    pub weather_code: i32,
    /// Short summary, e.g. "Clear" vs "clear sky".
    pub short_desc: String,
    pub long_desc: String,
    pub max_temp_c: Decimal,
    pub min_temp_c: Decimal,
    /// Real-time reading; only the batch's "today" row carries one.
    pub current_temp_c: Option<Decimal>,
    pub humidity_pct: Decimal,
    pub pressure_hpa: Decimal,
    /// Absent on the "today" row when the real-time payload omits wind.
    pub wind_speed_ms: Option<Decimal>,
    pub wind_direction_deg: Option<Decimal>,
    pub cloudiness_pct: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
}

/// A location-associated image reference from the photo metadata service.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; some never read by the API layer
pub struct Photo {
    pub id: Uuid,
    pub location_id: Uuid,
    pub url: String,
    pub title: String,
    pub owner: String,
    /// Capture date as reported by the metadata service (free-form string).
    pub taken_on: String,
    /// Size of the full set this row belongs to, denormalized onto every
    /// row for display-layer paging.
    pub total_count: i32,
    pub created_at: DateTime<Utc>,
}
