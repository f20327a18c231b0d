//! Tracked-location endpoints.
//!
//! - GET /api/v1/locations — the tracked set
//! - DELETE /api/v1/locations/:name — stop tracking a city
//!
//! Locations are never created here; a city enters the tracked set on its
//! first successful sync. Deletion cascades to the city's forecast and
//! photo rows.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{models, queries};
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::dec_to_f64;
use crate::services::sync::SyncContext;

/// A tracked location.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    /// The query string the location is tracked under
    pub input_name: String,
    /// Canonical city name from the provider
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationResponse {
    fn from_row(l: &models::Location) -> Self {
        Self {
            input_name: l.input_name.clone(),
            display_name: l.display_name.clone(),
            latitude: dec_to_f64(l.latitude),
            longitude: dec_to_f64(l.longitude),
        }
    }
}

/// List all tracked locations.
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    tag = "Locations",
    responses(
        (status = 200, description = "All tracked locations", body = [LocationResponse]),
    )
)]
pub async fn list_locations(
    State(ctx): State<SyncContext>,
) -> Result<Json<Vec<LocationResponse>>, AppError> {
    let locations = queries::list_locations(&ctx.pool).await?;
    Ok(Json(
        locations.iter().map(LocationResponse::from_row).collect(),
    ))
}

/// Stop tracking a location.
///
/// Removes the location row and, by cascade, its forecast and photo rows.
#[utoipa::path(
    delete,
    path = "/api/v1/locations/{name}",
    tag = "Locations",
    params(
        ("name" = String, Path, description = "Tracked location query string"),
    ),
    responses(
        (status = 204, description = "Location removed"),
        (status = 404, description = "Location is not tracked", body = ErrorResponse),
    )
)]
pub async fn delete_location(
    State(ctx): State<SyncContext>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = queries::delete_location(&ctx.pool, &ctx.changes, &name).await?;

    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "Location '{}' is not tracked",
            name
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
