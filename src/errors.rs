use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// Outcome of the most recent sync attempt, surfaced to the presentation
/// layer so it can explain an otherwise empty result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Last sync completed and the store holds fresh data.
    Ok,
    /// The weather provider was unreachable or answered with garbage.
    Down,
    /// The provider reported the queried location as unknown.
    InvalidLocation,
    /// The provider (or our own store) failed in some other way.
    ServerError,
    /// An automatic run found nothing to sync.
    NoLocationTracked,
}

/// Failure taxonomy for one sync cycle. Every non-`Store` variant leaves
/// previously cached data untouched and queryable.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Network-level failure or an empty/unreadable body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Malformed JSON or a missing required field in a provider payload.
    #[error("payload parse error: {0}")]
    Parse(String),

    /// The provider reported that the queried location does not exist.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// The provider reported a failure code other than not-found.
    #[error("provider error: {0}")]
    Server(String),

    /// A constraint violation or other database failure during reconcile.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl SyncError {
    /// The server-status a cycle failing with this error leaves behind.
    pub fn server_status(&self) -> ServerStatus {
        match self {
            SyncError::Transport(_) | SyncError::Parse(_) => ServerStatus::Down,
            SyncError::InvalidLocation(_) => ServerStatus::InvalidLocation,
            SyncError::Server(_) | SyncError::Store(_) => ServerStatus::ServerError,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal database error".to_string(),
                )
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_maps_to_down() {
        let err = SyncError::Transport("connection refused".to_string());
        assert_eq!(err.server_status(), ServerStatus::Down);
    }

    #[test]
    fn test_parse_maps_to_down() {
        let err = SyncError::Parse("missing field".to_string());
        assert_eq!(err.server_status(), ServerStatus::Down);
    }

    #[test]
    fn test_invalid_location_maps_to_invalid_location() {
        let err = SyncError::InvalidLocation("no such city".to_string());
        assert_eq!(err.server_status(), ServerStatus::InvalidLocation);
    }

    #[test]
    fn test_server_maps_to_server_error() {
        let err = SyncError::Server("code 500".to_string());
        assert_eq!(err.server_status(), ServerStatus::ServerError);
    }

    #[test]
    fn test_store_maps_to_server_error() {
        let err = SyncError::Store(sqlx::Error::RowNotFound);
        assert_eq!(err.server_status(), ServerStatus::ServerError);
    }
}
