//! Notification collaborator.
//!
//! Owns cadence policy for weather notifications: which city may notify,
//! whether notifications are enabled at all, and how often the daily
//! cadence fires. Delivery itself is the platform layer's job; a qualifying
//! update is emitted as structured log output for it to present.

use chrono::{DateTime, Duration, Utc};

use crate::config::NotificationCadence;
use crate::db::models::{ForecastDay, Location};
use crate::helpers::{dec_to_f64, opt_dec_to_f64};
use crate::services::sync::SyncTrigger;

/// Minimum gap between daily-cadence notifications.
const DAILY_CADENCE_MIN_GAP_HOURS: i64 = 24;

/// Cadence gate in front of the platform notification layer.
#[derive(Debug, Clone)]
pub struct WeatherNotifier {
    enabled: bool,
    notification_city: Option<String>,
    cadence: NotificationCadence,
}

impl WeatherNotifier {
    pub fn new(
        enabled: bool,
        notification_city: Option<String>,
        cadence: NotificationCadence,
    ) -> Self {
        Self {
            enabled,
            notification_city,
            cadence,
        }
    }

    /// Whether an update for `input_name` at `now` qualifies for delivery.
    ///
    /// Updates for cities other than the designated one never notify. A
    /// manual trigger bypasses the daily gap (the user explicitly asked for
    /// fresh data); automatic runs respect it.
    pub fn should_notify(
        &self,
        input_name: &str,
        trigger: SyncTrigger,
        now: DateTime<Utc>,
        last_notified_at: Option<DateTime<Utc>>,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(city) = &self.notification_city else {
            return false;
        };
        if city != input_name {
            return false;
        }

        match self.cadence {
            NotificationCadence::Always => true,
            NotificationCadence::Daily => match (trigger, last_notified_at) {
                (SyncTrigger::Manual, _) => true,
                (SyncTrigger::Automatic, None) => true,
                (SyncTrigger::Automatic, Some(last)) => {
                    now - last >= Duration::hours(DAILY_CADENCE_MIN_GAP_HOURS)
                }
            },
        }
    }

    /// Emit the notification for a fresh "today" record if policy allows.
    /// Returns the new last-notification timestamp when one was delivered.
    pub fn notify(
        &self,
        location: &Location,
        today: &ForecastDay,
        trigger: SyncTrigger,
        now: DateTime<Utc>,
        last_notified_at: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        if !self.should_notify(&location.input_name, trigger, now, last_notified_at) {
            return None;
        }

        tracing::info!(
            city = %location.display_name,
            weather_code = today.weather_code,
            condition = %today.long_desc,
            current_temp_c = ?opt_dec_to_f64(today.current_temp_c),
            max_temp_c = dec_to_f64(today.max_temp_c),
            min_temp_c = dec_to_f64(today.min_temp_c),
            trigger = ?trigger,
            "weather notification"
        );

        Some(now)
    }
}
