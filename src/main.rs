// Cityweather API v0.1
use axum::routing::{delete, get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod notify;
mod routes;
mod services;

use config::AppConfig;
use db::changes::ChangeNotifier;
use notify::WeatherNotifier;
use services::owm::WeatherClient;
use services::photos::PhotoClient;
use services::sync::{SharedSyncState, SyncContext, SyncLocks, SyncState};

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// Cityweather API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cityweather API",
        version = "0.1.0",
        description = "Sync-and-store service for city weather. Periodically or on demand \
            fetches current conditions and the multi-day forecast for tracked cities, \
            normalizes them into a relational store together with city photo metadata, \
            and serves location- and date-scoped views of the merged result.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Locations", description = "Tracked-location management"),
        (name = "Forecasts", description = "Forecast retrieval"),
        (name = "Photos", description = "City photo metadata retrieval"),
        (name = "Sync", description = "Sync triggers and status"),
    ),
    paths(
        routes::health::health_check,
        routes::locations::list_locations,
        routes::locations::delete_location,
        routes::forecasts::get_location_forecast,
        routes::forecasts::get_location_forecast_day,
        routes::photos::get_location_photos,
        routes::sync::trigger_location_sync,
        routes::sync::trigger_automatic_sync,
        routes::sync::get_sync_status,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::locations::LocationResponse,
            routes::forecasts::ForecastDayResponse,
            routes::forecasts::ForecastWindowResponse,
            routes::photos::PhotoResponse,
            routes::photos::PhotoSetResponse,
            routes::sync::SyncStatusResponse,
            errors::ServerStatus,
            errors::ErrorResponse,
            config::DisplayUnits,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cityweather_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Remote clients
    let weather_client = WeatherClient::new(&config.weather_base_url, &config.weather_api_key);
    let photo_client = PhotoClient::new(&config.photo_base_url);

    // Shared sync machinery
    let sync_state: SharedSyncState = Arc::new(RwLock::new(SyncState::new()));
    let notifier = WeatherNotifier::new(
        config.notifications_enabled,
        config.notification_city.clone(),
        config.notification_cadence,
    );

    let ctx = SyncContext {
        pool,
        weather: weather_client,
        photos: photo_client,
        changes: ChangeNotifier::new(),
        state: sync_state,
        locks: Arc::new(SyncLocks::new()),
        notifier,
        sync_all_locations: config.sync_all_locations,
        notification_city: config.notification_city.clone(),
        display_units: config.display_units,
    };

    // Spawn the automatic sync scheduler
    tokio::spawn(services::scheduler::run_scheduler(
        ctx.clone(),
        config.sync_interval_hours,
    ));

    // Change journal: committed store writes, visible in the logs
    let mut changes_rx = ctx.changes.subscribe();
    tokio::spawn(async move {
        loop {
            match changes_rx.recv().await {
                Ok(change) => tracing::debug!(?change, "store change committed"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("change journal lagged, skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // CORS — reads plus the fire-and-forget sync/management verbs
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers(Any);

    // Build router. "/sync/status" is static, so it wins over the
    // ":location" capture on the same segment.
    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/locations", get(routes::locations::list_locations))
        .route(
            "/api/v1/locations/:name",
            delete(routes::locations::delete_location),
        )
        .route(
            "/api/v1/forecast/:location",
            get(routes::forecasts::get_location_forecast),
        )
        .route(
            "/api/v1/forecast/:location/:date",
            get(routes::forecasts::get_location_forecast_day),
        )
        .route(
            "/api/v1/photos/:location",
            get(routes::photos::get_location_photos),
        )
        .route("/api/v1/sync", post(routes::sync::trigger_automatic_sync))
        .route("/api/v1/sync/status", get(routes::sync::get_sync_status))
        .route(
            "/api/v1/sync/:location",
            post(routes::sync::trigger_location_sync),
        )
        .with_state(ctx)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
