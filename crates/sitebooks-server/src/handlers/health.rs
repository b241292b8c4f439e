//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cache_backend: &'static str,
    pub cache_configured: bool,
    pub transactions: i64,
}

/// GET /api/health - Liveness, database reachability and cache backend
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let db = state.db.clone();
    let transactions = tokio::task::spawn_blocking(move || db.count_transactions()).await??;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache_backend: state.cache.name(),
        cache_configured: state.cache.is_configured(),
        transactions,
    }))
}
