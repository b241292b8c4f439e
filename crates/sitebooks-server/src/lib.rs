//! Sitebooks Web Server
//!
//! Axum-based REST API for the Sitebooks reporting service.
//!
//! - Report routes (POST with a JSON body, GET with query parameters)
//! - Report cache invalidation
//! - Cache pre-warm job route gated by a shared bearer secret
//! - Restrictive CORS policy and security headers
//! - Every failure answers `{"success": false, "error": "..."}`

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use sitebooks_core::{CacheClient, Database, ReportService};

mod handlers;
mod scheduler;

pub use scheduler::{
    start_cache_warmer, warm_report_cache, warm_targets, CacheWarmConfig, WarmResult,
};

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Shared secret for the cache warm job route (None = route always refuses)
    pub cron_secret: Option<String>,
}

impl ServerConfig {
    /// Build configuration from environment variables
    ///
    /// - `SITEBOOKS_ALLOWED_ORIGINS`: comma-separated CORS origins
    /// - `SITEBOOKS_CRON_SECRET`: bearer secret for `/api/cron/warm-cache`
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("SITEBOOKS_ALLOWED_ORIGINS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        let cron_secret = std::env::var("SITEBOOKS_CRON_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            allowed_origins,
            cron_secret,
        }
    }
}

/// Split a comma-separated list, dropping blanks
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub reports: ReportService,
    pub cache: CacheClient,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(db: Database, cache: CacheClient, config: ServerConfig) -> Router {
    if config.cron_secret.is_none() {
        info!("SITEBOOKS_CRON_SECRET not set, cache warm route will refuse all requests");
    }

    let state = Arc::new(AppState {
        reports: ReportService::new(db.clone()),
        db,
        cache,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Reports
        .route(
            "/reports/:kind",
            get(handlers::get_report).post(handlers::post_report),
        )
        .route("/reports/:kind/cache", delete(handlers::invalidate_report))
        // Scheduled jobs
        .route(
            "/cron/warm-cache",
            get(handlers::warm_cache).post(handlers::warm_cache),
        );

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// Start the server with configuration taken from the environment
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, CacheClient::from_env(), host, port, ServerConfig::from_env()).await
}

/// Start the server with explicit configuration
pub async fn serve_with_config(
    db: Database,
    cache: CacheClient,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if cache.is_configured() {
        info!(backend = cache.name(), "Report cache enabled");
    } else {
        warn!("Report cache disabled; every request computes from the database");
    }

    // Start cache warmer if configured
    if let Some(warm_config) = CacheWarmConfig::from_env() {
        start_cache_warmer(ReportService::new(db.clone()), cache.clone(), warm_config);
    }

    let app = create_router(db, cache, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Request failed");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // The message is passed through so the UI can show it
            message: err.to_string(),
            internal: Some(err),
        }
    }
}
