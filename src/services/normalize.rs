//! Payload normalization.
//!
//! Turns the two raw provider bodies into one ordered batch of forecast-day
//! records anchored to canonical day keys, or a typed failure. No partial
//! batches: a missing required field anywhere rejects the whole pair, so
//! the store never sees half a day.
//!
//! The provider sends daily forecasts in order starting from "today" in the
//! city's local time. Day records are keyed positionally: day `i` gets
//! `today + i` in canonical (UTC) days. If the provider's first entry ever
//! covered a different calendar day than the real-time reading, the keys
//! would be off by construction; the per-entry timestamps are deliberately
//! not consulted (see DESIGN.md).

use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::SyncError;

/// Provider success code embedded in payload bodies.
const PROVIDER_CODE_OK: i64 = 200;
/// Provider code for an unknown location.
const PROVIDER_CODE_NOT_FOUND: i64 = 404;

/// A fully normalized fetch result for one location.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    /// Canonical city name from the provider.
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Ordered day records; index 0 is the canonical "today", built from the
    /// current-conditions payload rather than the forecast list.
    pub days: Vec<DayRecord>,
}

/// One normalized calendar day, still in provider units (Celsius, hPa, m/s).
#[derive(Debug, Clone)]
pub struct DayRecord {
    pub day: NaiveDate,
    pub weather_code: i32,
    pub short_desc: String,
    pub long_desc: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    /// Real-time temperature; only the "today" record carries one.
    pub current_temp_c: Option<f64>,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
    pub wind_speed_ms: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub cloudiness_pct: Option<f64>,
}

// --- provider JSON response types ---

#[derive(Debug, Deserialize)]
struct CurrentPayload {
    name: String,
    coord: Coord,
    weather: Vec<Condition>,
    main: CurrentReadings,
    wind: Option<Wind>,
    clouds: Option<Clouds>,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    id: i32,
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct CurrentReadings {
    temp: f64,
    temp_max: f64,
    temp_min: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct Clouds {
    all: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastPayload {
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    temp: TempRange,
    pressure: f64,
    humidity: f64,
    wind: Wind,
    clouds: Clouds,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct TempRange {
    max: f64,
    min: f64,
}

/// Normalize the two raw payload bodies into an ordered day batch.
///
/// `today` is the canonical day the batch is anchored to. Day 0 is built
/// entirely from the current-conditions payload (its `current_temp_c` is
/// authoritative); entry 0 of the forecast list covers the same day and is
/// discarded in its favour. Days 1..N come from forecast entries 1..N.
///
/// # Errors
///
/// `Parse` for malformed JSON or any missing required field;
/// `InvalidLocation` / `Server` when a payload carries a provider error
/// code instead of data.
pub fn normalize_payloads(
    current_body: &str,
    forecast_body: &str,
    today: NaiveDate,
) -> Result<NormalizedBatch, SyncError> {
    let current_value: Value = serde_json::from_str(current_body)
        .map_err(|e| SyncError::Parse(format!("current-conditions body is not JSON: {}", e)))?;
    let forecast_value: Value = serde_json::from_str(forecast_body)
        .map_err(|e| SyncError::Parse(format!("forecast body is not JSON: {}", e)))?;

    check_provider_code(&current_value)?;
    check_provider_code(&forecast_value)?;

    let current: CurrentPayload = serde_json::from_value(current_value)
        .map_err(|e| SyncError::Parse(format!("current-conditions structure: {}", e)))?;
    let forecast: ForecastPayload = serde_json::from_value(forecast_value)
        .map_err(|e| SyncError::Parse(format!("forecast structure: {}", e)))?;

    let today_condition = current.weather.first().ok_or_else(|| {
        SyncError::Parse("current-conditions weather array is empty".to_string())
    })?;

    let mut days = Vec::with_capacity(forecast.list.len().max(1));

    days.push(DayRecord {
        day: today,
        weather_code: today_condition.id,
        short_desc: today_condition.main.clone(),
        long_desc: today_condition.description.clone(),
        max_temp_c: current.main.temp_max,
        min_temp_c: current.main.temp_min,
        current_temp_c: Some(current.main.temp),
        humidity_pct: current.main.humidity,
        pressure_hpa: current.main.pressure,
        wind_speed_ms: current.wind.as_ref().map(|w| w.speed),
        wind_direction_deg: current.wind.as_ref().map(|w| w.deg),
        cloudiness_pct: current.clouds.as_ref().map(|c| c.all),
    });

    for (i, entry) in forecast.list.iter().enumerate().skip(1) {
        let condition = entry.weather.first().ok_or_else(|| {
            SyncError::Parse(format!("forecast entry {} has an empty weather array", i))
        })?;

        days.push(DayRecord {
            day: today + Duration::days(i as i64),
            weather_code: condition.id,
            short_desc: condition.main.clone(),
            long_desc: condition.description.clone(),
            max_temp_c: entry.temp.max,
            min_temp_c: entry.temp.min,
            current_temp_c: None,
            humidity_pct: entry.humidity,
            pressure_hpa: entry.pressure,
            wind_speed_ms: Some(entry.wind.speed),
            wind_direction_deg: Some(entry.wind.deg),
            cloudiness_pct: Some(entry.clouds.all),
        });
    }

    Ok(NormalizedBatch {
        display_name: current.name,
        latitude: current.coord.lat,
        longitude: current.coord.lon,
        days,
    })
}

/// Inspect a payload for the provider's embedded status code field.
///
/// An absent field or 200 means success. The code arrives as a number on
/// one endpoint and as a numeric string on the other, so both are accepted.
fn check_provider_code(payload: &Value) -> Result<(), SyncError> {
    let Some(raw) = payload.get("cod") else {
        return Ok(());
    };

    let code = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    };

    match code {
        Some(PROVIDER_CODE_OK) => Ok(()),
        Some(PROVIDER_CODE_NOT_FOUND) => Err(SyncError::InvalidLocation(
            "provider reported the location as unknown".to_string(),
        )),
        Some(other) => Err(SyncError::Server(format!(
            "provider reported status code {}",
            other
        ))),
        None => Err(SyncError::Server(format!(
            "provider status code is unreadable: {}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    /// The current-conditions body from the interface contract, verbatim.
    fn paris_current() -> String {
        json!({
            "coord": {"lat": 1.0, "lon": 2.0},
            "name": "Paris",
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}],
            "main": {"temp": 20.0, "temp_max": 22.0, "temp_min": 18.0, "humidity": 40, "pressure": 1012}
        })
        .to_string()
    }

    /// A forecast body with `count` valid daily entries.
    fn forecast_with_days(count: usize) -> String {
        let entries: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "temp": {"max": 20.0 + i as f64, "min": 10.0 + i as f64},
                    "pressure": 1010.0,
                    "humidity": 50,
                    "wind": {"speed": 3.5, "deg": 180.0},
                    "clouds": {"all": 20},
                    "weather": [{"id": 500, "main": "Rain", "description": "light rain"}]
                })
            })
            .collect();
        json!({"cod": "200", "list": entries}).to_string()
    }

    #[test]
    fn test_happy_path_yields_full_window() {
        let batch = normalize_payloads(&paris_current(), &forecast_with_days(14), today()).unwrap();

        assert_eq!(batch.display_name, "Paris");
        assert_eq!(batch.latitude, 1.0);
        assert_eq!(batch.longitude, 2.0);
        assert_eq!(batch.days.len(), 14);
    }

    #[test]
    fn test_day_zero_comes_from_current_conditions() {
        let batch = normalize_payloads(&paris_current(), &forecast_with_days(14), today()).unwrap();

        let day0 = &batch.days[0];
        assert_eq!(day0.day, today());
        assert_eq!(day0.weather_code, 800);
        assert_eq!(day0.short_desc, "Clear");
        assert_eq!(day0.long_desc, "clear sky");
        assert_eq!(day0.current_temp_c, Some(20.0));
        assert_eq!(day0.max_temp_c, 22.0);
        assert_eq!(day0.min_temp_c, 18.0);
        // The current-conditions body carried no wind or clouds.
        assert_eq!(day0.wind_speed_ms, None);
        assert_eq!(day0.cloudiness_pct, None);
    }

    #[test]
    fn test_future_days_have_no_current_temp() {
        let batch = normalize_payloads(&paris_current(), &forecast_with_days(14), today()).unwrap();

        for day in &batch.days[1..] {
            assert_eq!(day.current_temp_c, None);
            assert!(day.wind_speed_ms.is_some());
            assert!(day.cloudiness_pct.is_some());
        }
    }

    #[test]
    fn test_days_are_contiguous_and_ordered() {
        let batch = normalize_payloads(&paris_current(), &forecast_with_days(14), today()).unwrap();

        for (i, day) in batch.days.iter().enumerate() {
            assert_eq!(day.day, today() + Duration::days(i as i64));
        }
    }

    #[test]
    fn test_forecast_entry_zero_is_discarded() {
        // Entry 0 of the list covers the same day as the real-time reading;
        // day 1 of the batch must come from entry 1 (max 21.0, not 20.0).
        let batch = normalize_payloads(&paris_current(), &forecast_with_days(14), today()).unwrap();

        assert_eq!(batch.days[1].max_temp_c, 21.0);
        assert_eq!(batch.days[1].weather_code, 500);
    }

    #[test]
    fn test_current_wind_is_carried_when_present() {
        let current = json!({
            "coord": {"lat": 1.0, "lon": 2.0},
            "name": "Paris",
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}],
            "main": {"temp": 20.0, "temp_max": 22.0, "temp_min": 18.0, "humidity": 40, "pressure": 1012},
            "wind": {"speed": 4.2, "deg": 90.0},
            "clouds": {"all": 75}
        })
        .to_string();

        let batch = normalize_payloads(&current, &forecast_with_days(2), today()).unwrap();

        assert_eq!(batch.days[0].wind_speed_ms, Some(4.2));
        assert_eq!(batch.days[0].wind_direction_deg, Some(90.0));
        assert_eq!(batch.days[0].cloudiness_pct, Some(75.0));
    }

    #[test]
    fn test_not_found_code_in_current_body() {
        let err = normalize_payloads(r#"{"cod":"404"}"#, &forecast_with_days(14), today())
            .expect_err("a 404 body must not normalize");
        assert!(matches!(err, SyncError::InvalidLocation(_)));
    }

    #[test]
    fn test_not_found_code_in_forecast_body() {
        let err = normalize_payloads(&paris_current(), r#"{"cod":"404"}"#, today())
            .expect_err("a 404 body must not normalize");
        assert!(matches!(err, SyncError::InvalidLocation(_)));
    }

    #[test]
    fn test_numeric_error_code_is_accepted() {
        let err = normalize_payloads(r#"{"cod":404}"#, &forecast_with_days(14), today())
            .expect_err("a numeric 404 must behave like the string form");
        assert!(matches!(err, SyncError::InvalidLocation(_)));
    }

    #[test]
    fn test_other_error_code_is_server_error() {
        let err = normalize_payloads(r#"{"cod":"500"}"#, &forecast_with_days(14), today())
            .expect_err("a 500 body must not normalize");
        assert!(matches!(err, SyncError::Server(_)));
    }

    #[test]
    fn test_success_code_in_body_is_fine() {
        let mut current: Value = serde_json::from_str(&paris_current()).unwrap();
        current["cod"] = json!(200);

        let batch =
            normalize_payloads(&current.to_string(), &forecast_with_days(3), today()).unwrap();
        assert_eq!(batch.days.len(), 3);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = normalize_payloads("not json at all", &forecast_with_days(14), today())
            .expect_err("garbage must not normalize");
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn test_missing_required_field_rejects_whole_batch() {
        // No "main" object in the current-conditions body.
        let current = json!({
            "coord": {"lat": 1.0, "lon": 2.0},
            "name": "Paris",
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}]
        })
        .to_string();

        let err = normalize_payloads(&current, &forecast_with_days(14), today())
            .expect_err("a missing required field must reject the batch");
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn test_missing_field_in_one_forecast_entry_rejects_whole_batch() {
        let mut forecast: Value = serde_json::from_str(&forecast_with_days(5)).unwrap();
        forecast["list"][3].as_object_mut().unwrap().remove("temp");

        let err = normalize_payloads(&paris_current(), &forecast.to_string(), today())
            .expect_err("one bad entry must reject the batch");
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn test_empty_weather_array_rejects_batch() {
        let current = json!({
            "coord": {"lat": 1.0, "lon": 2.0},
            "name": "Paris",
            "weather": [],
            "main": {"temp": 20.0, "temp_max": 22.0, "temp_min": 18.0, "humidity": 40, "pressure": 1012}
        })
        .to_string();

        let err = normalize_payloads(&current, &forecast_with_days(14), today())
            .expect_err("an empty weather array must reject the batch");
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn test_empty_forecast_list_still_yields_today() {
        // The window is whatever the provider returns; a bare current
        // reading still produces the "today" record.
        let batch =
            normalize_payloads(&paris_current(), r#"{"cod":"200","list":[]}"#, today()).unwrap();
        assert_eq!(batch.days.len(), 1);
        assert_eq!(batch.days[0].current_temp_c, Some(20.0));
    }

    #[test]
    fn test_unreadable_code_is_server_error() {
        let err = normalize_payloads(r#"{"cod":true}"#, &forecast_with_days(14), today())
            .expect_err("a non-numeric code must not normalize");
        assert!(matches!(err, SyncError::Server(_)));
    }
}
