//! Scheduled job handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::scheduler::{warm_report_cache, WarmResult};
use crate::{AppError, AppState, ServerConfig};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmCacheResponse {
    pub success: bool,
    pub cache_backend: &'static str,
    pub warmed: usize,
    pub results: Vec<WarmResult>,
}

/// Compare a provided secret against the expected one in constant time
fn secrets_match(provided: &str, expected: &str) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();
    provided_bytes.len() == expected_bytes.len() && bool::from(provided_bytes.ct_eq(expected_bytes))
}

/// Check the `Authorization: Bearer <secret>` header against the cron secret
///
/// Without a configured secret every request is refused.
pub(crate) fn authorize_cron(config: &ServerConfig, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(secret) = config.cron_secret.as_deref() else {
        warn!("Cache warm requested but SITEBOOKS_CRON_SECRET is not set");
        return Err(AppError::unauthorized("Unauthorized"));
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if secrets_match(provided, secret) {
        Ok(())
    } else {
        Err(AppError::unauthorized("Unauthorized"))
    }
}

/// GET|POST /api/cron/warm-cache - Pre-compute the commonly requested reports
pub async fn warm_cache(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<WarmCacheResponse>, AppError> {
    authorize_cron(&state.config, &headers)?;

    let results = warm_report_cache(&state.reports, &state.cache, Utc::now().date_naive()).await;
    let warmed = results.iter().filter(|r| r.success).count();
    info!(warmed, total = results.len(), "Cache warm job finished");

    Ok(Json(WarmCacheResponse {
        success: true,
        cache_backend: state.cache.name(),
        warmed,
        results,
    }))
}
