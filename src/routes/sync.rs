//! Sync trigger and status endpoints.
//!
//! - POST /api/v1/sync/:location — run a manual cycle for one city
//! - POST /api/v1/sync — run an automatic batch cycle
//! - GET /api/v1/sync/status — current sync state
//!
//! Triggers are fire-and-forget: the cycle is spawned and the request
//! returns 202 immediately, matching the external scheduler contract (side
//! effects only, no return value).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::DisplayUnits;
use crate::errors::ServerStatus;
use crate::services::sync::{self, SyncContext, SyncTrigger};

/// Current sync state as reported by the status endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    /// Outcome flag of the most recent sync attempt; explains an empty
    /// result set to the presentation layer.
    pub server_status: ServerStatus,
    pub last_cycle_location: Option<String>,
    /// "done", "fetch_failed", "parse_failed" or "store_failed"
    pub last_cycle_outcome: Option<String>,
    pub last_cycle_completed_at: Option<DateTime<Utc>>,
    /// When the scheduler will run its next automatic batch, if enabled
    pub next_automatic_run_at: Option<DateTime<Utc>>,
    pub total_cycles: u64,
    pub last_notified_at: Option<DateTime<Utc>>,
    /// Unit system the display layer should render temperatures in;
    /// stored and served values are always Celsius.
    pub display_units: DisplayUnits,
}

/// Trigger a manual sync cycle for one location.
///
/// Fire-and-forget: returns 202 immediately; progress is visible through
/// the status endpoint and the store itself.
#[utoipa::path(
    post,
    path = "/api/v1/sync/{location}",
    tag = "Sync",
    params(
        ("location" = String, Path, description = "Location query string to sync"),
    ),
    responses(
        (status = 202, description = "Sync cycle accepted"),
    )
)]
pub async fn trigger_location_sync(
    State(ctx): State<SyncContext>,
    Path(location): Path<String>,
) -> StatusCode {
    tokio::spawn(async move {
        sync::sync_location(&ctx, &location, SyncTrigger::Manual).await;
    });
    StatusCode::ACCEPTED
}

/// Trigger an automatic batch cycle (same as a scheduler tick).
#[utoipa::path(
    post,
    path = "/api/v1/sync",
    tag = "Sync",
    responses(
        (status = 202, description = "Batch sync accepted"),
    )
)]
pub async fn trigger_automatic_sync(State(ctx): State<SyncContext>) -> StatusCode {
    tokio::spawn(async move {
        sync::sync_automatic(&ctx).await;
    });
    StatusCode::ACCEPTED
}

/// Get the current sync state.
#[utoipa::path(
    get,
    path = "/api/v1/sync/status",
    tag = "Sync",
    responses(
        (status = 200, description = "Current sync state", body = SyncStatusResponse),
    )
)]
pub async fn get_sync_status(State(ctx): State<SyncContext>) -> Json<SyncStatusResponse> {
    let s = ctx.state.read().await;
    Json(SyncStatusResponse {
        server_status: s.server_status,
        last_cycle_location: s.last_cycle_location.clone(),
        last_cycle_outcome: s.last_cycle_outcome.clone(),
        last_cycle_completed_at: s.last_cycle_completed_at,
        next_automatic_run_at: s.next_automatic_run_at,
        total_cycles: s.total_cycles,
        last_notified_at: s.last_notified_at,
        display_units: ctx.display_units,
    })
}
