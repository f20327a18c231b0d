//! Sync orchestration.
//!
//! Runs the fetch → normalize → reconcile → notify pipeline for one
//! location, and fans out across tracked locations for automatic runs.
//! Cycles for the same location are serialized through a keyed lock so one
//! cycle's delete-then-insert never interleaves with another's; read paths
//! are untouched by the lock and simply observe pre-cycle data until the
//! bulk-replace commits.
//!
//! A cycle always ends in one of four terminal states. Every failure state
//! leaves previously cached data intact; only the server-status flag tells
//! the presentation layer what went wrong.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::config::DisplayUnits;
use crate::db::changes::ChangeNotifier;
use crate::db::queries::{self, InsertForecastDayParams, InsertPhotoParams};
use crate::errors::{ServerStatus, SyncError};
use crate::helpers::{canonical_day, f64_to_decimal_1dp, f64_to_decimal_full, opt_f64_to_decimal_1dp};
use crate::notify::WeatherNotifier;
use crate::services::normalize::{normalize_payloads, DayRecord};
use crate::services::owm::WeatherClient;
use crate::services::photos::PhotoClient;

/// What set a cycle in motion. Passed through to the notification
/// collaborator, whose cadence policy distinguishes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// A user asked for this location right now.
    Manual,
    /// The scheduler's periodic batch run.
    Automatic,
}

/// Terminal state of one sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Done,
    FetchFailed,
    ParseFailed,
    StoreFailed,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Done => "done",
            CycleOutcome::FetchFailed => "fetch_failed",
            CycleOutcome::ParseFailed => "parse_failed",
            CycleOutcome::StoreFailed => "store_failed",
        }
    }
}

/// Shared bookkeeping for the status surface.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SyncState {
    /// Outcome flag of the most recent sync attempt.
    pub server_status: ServerStatus,
    pub last_cycle_location: Option<String>,
    pub last_cycle_outcome: Option<String>,
    pub last_cycle_completed_at: Option<DateTime<Utc>>,
    /// When the scheduler will run its next automatic batch, if enabled.
    pub next_automatic_run_at: Option<DateTime<Utc>>,
    pub total_cycles: u64,
    /// When the notification collaborator last delivered.
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            server_status: ServerStatus::Ok,
            last_cycle_location: None,
            last_cycle_outcome: None,
            last_cycle_completed_at: None,
            next_automatic_run_at: None,
            total_cycles: 0,
            last_notified_at: None,
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared sync state handle.
pub type SharedSyncState = Arc<RwLock<SyncState>>;

/// Keyed locks serializing cycles per location.
///
/// Two concurrent triggers for the same city queue behind one mutex; cycles
/// for different cities proceed independently.
#[derive(Debug, Default)]
pub struct SyncLocks {
    inner: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_location(&self, input_name: &str) -> Arc<Mutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(input_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Take the lock for a location, creating it on first use. The guard is
    /// owned so it can be held across the cycle's await points.
    pub async fn acquire(&self, input_name: &str) -> OwnedMutexGuard<()> {
        self.for_location(input_name).lock_owned().await
    }
}

/// Everything a sync cycle needs, shared by the trigger routes and the
/// scheduler.
#[derive(Clone)]
pub struct SyncContext {
    pub pool: PgPool,
    pub weather: WeatherClient,
    pub photos: PhotoClient,
    pub changes: ChangeNotifier,
    pub state: SharedSyncState,
    pub locks: Arc<SyncLocks>,
    pub notifier: WeatherNotifier,
    /// Automatic runs cover every tracked location when true, otherwise
    /// only the notification city.
    pub sync_all_locations: bool,
    pub notification_city: Option<String>,
    pub display_units: DisplayUnits,
}

/// Run one full sync cycle for a location.
pub async fn sync_location(
    ctx: &SyncContext,
    input_name: &str,
    trigger: SyncTrigger,
) -> CycleOutcome {
    let _guard = ctx.locks.acquire(input_name).await;

    let outcome = run_cycle(ctx, input_name, trigger).await;

    {
        let mut s = ctx.state.write().await;
        s.last_cycle_location = Some(input_name.to_string());
        s.last_cycle_outcome = Some(outcome.as_str().to_string());
        s.last_cycle_completed_at = Some(Utc::now());
        s.total_cycles += 1;
    }

    outcome
}

async fn run_cycle(ctx: &SyncContext, input_name: &str, trigger: SyncTrigger) -> CycleOutcome {
    tracing::info!(location = input_name, ?trigger, "sync cycle started");

    // FETCHING
    let payloads = ctx.weather.fetch_payloads(input_name).await;
    if !payloads.is_complete() {
        set_server_status(ctx, ServerStatus::Down).await;
        tracing::warn!(
            location = input_name,
            "fetch failed at transport, keeping cached data"
        );
        return CycleOutcome::FetchFailed;
    }

    // PARSING
    let today = canonical_day(Utc::now());
    let batch = match normalize_payloads(&payloads.current, &payloads.forecast, today) {
        Ok(batch) => batch,
        Err(e) => {
            set_server_status(ctx, e.server_status()).await;
            tracing::warn!(
                location = input_name,
                error = %e,
                "normalization failed, keeping cached data"
            );
            return CycleOutcome::ParseFailed;
        }
    };

    // RECONCILING
    let location_id = match reconcile_forecast(ctx, input_name, &batch, today).await {
        Ok(id) => id,
        Err(e) => {
            set_server_status(ctx, ServerStatus::ServerError).await;
            tracing::error!(
                location = input_name,
                error = %e,
                "store write failed, cycle aborted"
            );
            return CycleOutcome::StoreFailed;
        }
    };

    // Photo side-channel, keyed by the resolved display name. Independently
    // failable: a failure here leaves the previous photo set in place and
    // does not roll back the forecast write.
    if let Err(e) = refresh_photos(ctx, input_name, location_id, &batch.display_name).await {
        tracing::warn!(
            location = input_name,
            error = %e,
            "photo refresh failed, keeping previous photo set"
        );
    }

    // DONE
    set_server_status(ctx, ServerStatus::Ok).await;
    trigger_notification(ctx, input_name, today, trigger).await;

    tracing::info!(
        location = input_name,
        days = batch.days.len(),
        "sync cycle complete"
    );
    CycleOutcome::Done
}

/// Automatic batch run: either every tracked location or just the
/// notification-designated one. Each cycle is independent; one failure is
/// logged and the batch moves on.
pub async fn sync_automatic(ctx: &SyncContext) {
    let targets: Vec<String> = if ctx.sync_all_locations {
        match queries::list_tracked_input_names(&ctx.pool).await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!("Failed to list tracked locations for automatic sync: {}", e);
                return;
            }
        }
    } else {
        ctx.notification_city.iter().cloned().collect()
    };

    if targets.is_empty() {
        tracing::info!("Automatic sync found no location to update");
        set_server_status(ctx, ServerStatus::NoLocationTracked).await;
        return;
    }

    for name in targets {
        let outcome = sync_location(ctx, &name, SyncTrigger::Automatic).await;
        if outcome != CycleOutcome::Done {
            tracing::warn!(
                location = %name,
                outcome = outcome.as_str(),
                "cycle failed during automatic run, continuing with remaining locations"
            );
        }
    }
}

/// Resolve the location row and atomically replace its forecast window.
async fn reconcile_forecast(
    ctx: &SyncContext,
    input_name: &str,
    batch: &crate::services::normalize::NormalizedBatch,
    as_of: chrono::NaiveDate,
) -> Result<Uuid, sqlx::Error> {
    let location_id = queries::resolve_or_create_location(
        &ctx.pool,
        &ctx.changes,
        input_name,
        &batch.display_name,
        f64_to_decimal_full(batch.latitude),
        f64_to_decimal_full(batch.longitude),
    )
    .await?;

    let rows: Vec<InsertForecastDayParams> =
        batch.days.iter().map(day_record_to_params).collect();

    queries::replace_forecast_days(
        &ctx.pool,
        &ctx.changes,
        input_name,
        location_id,
        as_of,
        Utc::now(),
        &rows,
    )
    .await?;

    Ok(location_id)
}

fn day_record_to_params(record: &DayRecord) -> InsertForecastDayParams {
    InsertForecastDayParams {
        day: record.day,
        weather_code: record.weather_code,
        short_desc: record.short_desc.clone(),
        long_desc: record.long_desc.clone(),
        max_temp_c: f64_to_decimal_1dp(record.max_temp_c),
        min_temp_c: f64_to_decimal_1dp(record.min_temp_c),
        current_temp_c: opt_f64_to_decimal_1dp(record.current_temp_c),
        humidity_pct: f64_to_decimal_1dp(record.humidity_pct),
        pressure_hpa: f64_to_decimal_1dp(record.pressure_hpa),
        wind_speed_ms: opt_f64_to_decimal_1dp(record.wind_speed_ms),
        wind_direction_deg: opt_f64_to_decimal_1dp(record.wind_direction_deg),
        cloudiness_pct: opt_f64_to_decimal_1dp(record.cloudiness_pct),
    }
}

/// Fetch and store the photo set for a freshly synced location.
async fn refresh_photos(
    ctx: &SyncContext,
    input_name: &str,
    location_id: Uuid,
    display_name: &str,
) -> Result<(), SyncError> {
    let records = ctx.photos.fetch_city_photos(display_name).await?;

    let rows: Vec<InsertPhotoParams> = records
        .into_iter()
        .map(|p| InsertPhotoParams {
            url: p.url,
            title: p.title,
            owner: p.owner,
            taken_on: p.taken_on,
        })
        .collect();

    queries::replace_photos(&ctx.pool, &ctx.changes, input_name, location_id, &rows).await?;
    Ok(())
}

/// Hand the fresh "today" record to the notification collaborator.
async fn trigger_notification(
    ctx: &SyncContext,
    input_name: &str,
    today: chrono::NaiveDate,
    trigger: SyncTrigger,
) {
    let location = match queries::get_location(&ctx.pool, input_name).await {
        Ok(Some(location)) => location,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(location = input_name, "notification lookup failed: {}", e);
            return;
        }
    };

    let day = match queries::get_forecast_day(&ctx.pool, input_name, today).await {
        Ok(Some(day)) => day,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(location = input_name, "notification lookup failed: {}", e);
            return;
        }
    };

    let now = Utc::now();
    let last = ctx.state.read().await.last_notified_at;
    if let Some(delivered_at) = ctx.notifier.notify(&location, &day, trigger, now, last) {
        ctx.state.write().await.last_notified_at = Some(delivered_at);
    }
}

async fn set_server_status(ctx: &SyncContext, status: ServerStatus) {
    ctx.state.write().await.server_status = status;
}
