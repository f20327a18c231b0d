//! Forecast read endpoints.
//!
//! - GET /api/v1/forecast/:location?from=YYYY-MM-DD
//! - GET /api/v1/forecast/:location/:date
//!
//! These are pure reads against the store; they never trigger a fetch and
//! are servable at any time, including while a sync is in flight (a reader
//! then sees the pre-sync window until the bulk-replace commits).

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::{models, queries};
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::{canonical_day, dec_to_f64, opt_dec_to_f64};
use crate::services::sync::SyncContext;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ForecastWindowQuery {
    /// First day of the window (YYYY-MM-DD); defaults to the canonical today.
    pub from: Option<String>,
}

/// One forecast day as served to the presentation layer. Temperatures are
/// Celsius; unit conversion is the display layer's job.
#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastDayResponse {
    /// Canonical day key (UTC calendar day)
    pub day: NaiveDate,
    /// Provider condition code, drives icon selection
    pub weather_code: i32,
    pub short_desc: String,
    pub long_desc: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    /// Real-time reading; present only on the window's "today" row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temp_c: Option<f64>,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudiness_pct: Option<f64>,
    /// When this row was fetched from the provider (ISO 8601)
    pub fetched_at: String,
}

impl ForecastDayResponse {
    fn from_row(f: &models::ForecastDay) -> Self {
        Self {
            day: f.day,
            weather_code: f.weather_code,
            short_desc: f.short_desc.clone(),
            long_desc: f.long_desc.clone(),
            max_temp_c: dec_to_f64(f.max_temp_c),
            min_temp_c: dec_to_f64(f.min_temp_c),
            current_temp_c: opt_dec_to_f64(f.current_temp_c),
            humidity_pct: dec_to_f64(f.humidity_pct),
            pressure_hpa: dec_to_f64(f.pressure_hpa),
            wind_speed_ms: opt_dec_to_f64(f.wind_speed_ms),
            wind_direction_deg: opt_dec_to_f64(f.wind_direction_deg),
            cloudiness_pct: opt_dec_to_f64(f.cloudiness_pct),
            fetched_at: f.fetched_at.to_rfc3339(),
        }
    }
}

/// Forecast window response for one location.
#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastWindowResponse {
    /// The query string the location is tracked under
    pub location: String,
    /// Canonical city name from the provider
    pub display_name: String,
    /// First day of the returned window
    pub from: NaiveDate,
    /// Days ascending by date
    pub days: Vec<ForecastDayResponse>,
}

/// Get a location's forecast days from a start date onwards.
///
/// Days are returned ascending by date. The start date defaults to the
/// canonical "today" when not given, so an open view always starts at the
/// current day regardless of wall-clock hour.
#[utoipa::path(
    get,
    path = "/api/v1/forecast/{location}",
    tag = "Forecasts",
    params(
        ("location" = String, Path, description = "Tracked location query string"),
        ForecastWindowQuery,
    ),
    responses(
        (status = 200, description = "Forecast window for the location", body = ForecastWindowResponse),
        (status = 400, description = "Invalid from date", body = ErrorResponse),
        (status = 404, description = "Location is not tracked", body = ErrorResponse),
    )
)]
pub async fn get_location_forecast(
    State(ctx): State<SyncContext>,
    Path(location): Path<String>,
    Query(params): Query<ForecastWindowQuery>,
) -> Result<Json<ForecastWindowResponse>, AppError> {
    let from = match params.from {
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map_err(|e| AppError::BadRequest(format!("Invalid from date: {}", e)))?,
        None => canonical_day(Utc::now()),
    };

    let tracked = queries::get_location(&ctx.pool, &location)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location '{}' is not tracked", location)))?;

    let days = queries::get_forecast_days_from(&ctx.pool, &location, from).await?;

    Ok(Json(ForecastWindowResponse {
        location: tracked.input_name,
        display_name: tracked.display_name,
        from,
        days: days.iter().map(ForecastDayResponse::from_row).collect(),
    }))
}

/// Get the single forecast day for a location and date.
#[utoipa::path(
    get,
    path = "/api/v1/forecast/{location}/{date}",
    tag = "Forecasts",
    params(
        ("location" = String, Path, description = "Tracked location query string"),
        ("date" = String, Path, description = "Canonical day (YYYY-MM-DD)"),
    ),
    responses(
        (status = 200, description = "The forecast day", body = ForecastDayResponse),
        (status = 400, description = "Invalid date", body = ErrorResponse),
        (status = 404, description = "No forecast for that location and date", body = ErrorResponse),
    )
)]
pub async fn get_location_forecast_day(
    State(ctx): State<SyncContext>,
    Path((location, date)): Path<(String, String)>,
) -> Result<Json<ForecastDayResponse>, AppError> {
    let date = date
        .parse::<NaiveDate>()
        .map_err(|e| AppError::BadRequest(format!("Invalid date: {}", e)))?;

    let day = queries::get_forecast_day(&ctx.pool, &location, date)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No forecast for '{}' on {}", location, date))
        })?;

    Ok(Json(ForecastDayResponse::from_row(&day)))
}
