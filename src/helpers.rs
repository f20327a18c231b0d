//! Shared helpers: Decimal ↔ f64 conversions and canonical-day arithmetic.
//!
//! Two f64→Decimal strategies exist because weather values and geo
//! coordinates have different precision requirements:
//!
//! - `f64_to_decimal_1dp`: rounds to 1 decimal place (temperature, wind, etc.)
//! - `f64_to_decimal_full`: preserves full f64 precision (lat, lon)
//!
//! Both return `Decimal::ZERO` for non-finite inputs (NaN, ±Inf).
//!
//! The canonical day key is the UTC calendar day of an instant. All stored
//! forecast dates use it, so date-range comparisons are independent of any
//! location's local offset.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Convert an f64 to Decimal, rounded to 1 decimal place.
///
/// Used for weather values (temperature, wind speed, etc.) where 0.1°C /
/// 0.1 m/s precision is sufficient.
pub(crate) fn f64_to_decimal_1dp(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_1dp received non-finite value {}, defaulting to 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_str_exact(&format!("{:.1}", v)).unwrap_or_default()
}

/// Convert an optional f64 to Decimal (1 decimal place), returning None if input is None.
pub(crate) fn opt_f64_to_decimal_1dp(v: Option<f64>) -> Option<Decimal> {
    v.map(f64_to_decimal_1dp)
}

/// Convert an f64 to Decimal preserving full precision.
///
/// Used for coordinates, where full precision matters for pinpointing the
/// location on a map.
pub(crate) fn f64_to_decimal_full(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_full received non-finite value {}, defaulting to 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_f64(v).unwrap_or_else(|| Decimal::new(v as i64, 0))
}

/// Convert a Decimal to f64, defaulting to 0.0 for values that can't be represented.
pub(crate) fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Convert an Option<Decimal> to Option<f64>.
pub(crate) fn opt_dec_to_f64(d: Option<Decimal>) -> Option<f64> {
    d.and_then(|v| v.to_f64())
}

/// Canonical day key for an instant: its UTC calendar day.
pub(crate) fn canonical_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// The day before `day`. Forecast rows older than this are pruned after a
/// successful sync, bounding the table to a rolling window.
pub(crate) fn previous_day(day: NaiveDate) -> NaiveDate {
    day - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_f64_to_decimal_1dp_normal() {
        let d = f64_to_decimal_1dp(21.34);
        assert_eq!(d, Decimal::from_str("21.3").unwrap());
    }

    #[test]
    fn test_f64_to_decimal_1dp_rounds() {
        // 21.36 rounded to 1dp → 21.4
        let d = f64_to_decimal_1dp(21.36);
        assert_eq!(d, Decimal::from_str("21.4").unwrap());
    }

    #[test]
    fn test_f64_to_decimal_1dp_nan() {
        assert_eq!(f64_to_decimal_1dp(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn test_f64_to_decimal_1dp_infinity() {
        assert_eq!(f64_to_decimal_1dp(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_f64_to_decimal_full_normal() {
        let d = f64_to_decimal_full(48.8566);
        assert!(d > Decimal::ZERO);
    }

    #[test]
    fn test_f64_to_decimal_full_nan() {
        assert_eq!(f64_to_decimal_full(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn test_dec_to_f64_normal() {
        let d = Decimal::from_str("-4.7").unwrap();
        assert!((dec_to_f64(d) + 4.7).abs() < 1e-10);
    }

    #[test]
    fn test_opt_f64_to_decimal_1dp() {
        assert_eq!(opt_f64_to_decimal_1dp(None), None);
        assert_eq!(
            opt_f64_to_decimal_1dp(Some(3.14)),
            Some(Decimal::from_str("3.1").unwrap())
        );
    }

    #[test]
    fn test_opt_dec_to_f64() {
        assert_eq!(opt_dec_to_f64(None), None);
        let d = Decimal::from_str("3.14").unwrap();
        assert!((opt_dec_to_f64(Some(d)).unwrap() - 3.14).abs() < 1e-10);
    }

    #[test]
    fn test_canonical_day_ignores_wall_clock_hour() {
        // Any hour of the same UTC day maps to the same key.
        let morning = "2026-08-06T00:15:00Z".parse::<DateTime<Utc>>().unwrap();
        let evening = "2026-08-06T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(canonical_day(morning), expected);
        assert_eq!(canonical_day(evening), expected);
    }

    #[test]
    fn test_canonical_day_splits_at_utc_midnight() {
        let before = "2026-08-06T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let after = "2026-08-07T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_ne!(canonical_day(before), canonical_day(after));
    }

    #[test]
    fn test_previous_day() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(
            previous_day(day),
            NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
        );
    }

    #[test]
    fn test_previous_day_crosses_month_boundary() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert_eq!(
            previous_day(day),
            NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()
        );
    }
}
