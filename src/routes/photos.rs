//! Photo read endpoint.
//!
//! GET /api/v1/photos/:location — the full photo set for a tracked
//! location, as last replaced by a sync. No defined order.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{models, queries};
use crate::errors::{AppError, ErrorResponse};
use crate::services::sync::SyncContext;

/// One image reference.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoResponse {
    pub url: String,
    pub title: String,
    pub owner: String,
    /// Capture date as reported by the metadata service
    pub taken_on: String,
}

impl PhotoResponse {
    fn from_row(p: &models::Photo) -> Self {
        Self {
            url: p.url.clone(),
            title: p.title.clone(),
            owner: p.owner.clone(),
            taken_on: p.taken_on.clone(),
        }
    }
}

/// The full photo set for one location.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoSetResponse {
    /// The query string the location is tracked under
    pub location: String,
    /// Size of the set (denormalized onto every stored row for paging)
    pub total_count: i32,
    pub photos: Vec<PhotoResponse>,
}

/// Get the photo set for a location.
#[utoipa::path(
    get,
    path = "/api/v1/photos/{location}",
    tag = "Photos",
    params(
        ("location" = String, Path, description = "Tracked location query string"),
    ),
    responses(
        (status = 200, description = "Photo set for the location", body = PhotoSetResponse),
        (status = 404, description = "Location is not tracked", body = ErrorResponse),
    )
)]
pub async fn get_location_photos(
    State(ctx): State<SyncContext>,
    Path(location): Path<String>,
) -> Result<Json<PhotoSetResponse>, AppError> {
    let tracked = queries::get_location(&ctx.pool, &location)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location '{}' is not tracked", location)))?;

    let photos = queries::get_photos(&ctx.pool, &location).await?;

    // Every row carries the set size; an empty set has none to read from.
    let total_count = photos.first().map(|p| p.total_count).unwrap_or(0);

    Ok(Json(PhotoSetResponse {
        location: tracked.input_name,
        total_count,
        photos: photos.iter().map(PhotoResponse::from_row).collect(),
    }))
}
