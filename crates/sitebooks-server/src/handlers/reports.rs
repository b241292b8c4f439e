//! Report handlers
//!
//! Every report request goes through the same flow: derive the cache key,
//! try the cache, generate on a miss, store with the kind's TTL tier and
//! wrap the result in the response envelope.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{parse_list, AppError, AppState};
use sitebooks_core::models::parse_filter_date;
use sitebooks_core::{GroupBy, Report, ReportFilters, ReportKind, TransactionType};

/// Successful report response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub success: bool,
    pub data: Report,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub filters: ReportFilters,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub cached: bool,
    /// Milliseconds spent serving the request
    pub latency: u64,
}

/// Query parameters for GET report requests
///
/// Same fields as the POST body; `status` is comma-separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub project_id: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub category_id: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub group_by: Option<String>,
}

impl ReportQuery {
    /// Parse into filters, rejecting malformed values
    pub fn into_filters(self) -> Result<ReportFilters, AppError> {
        Ok(ReportFilters {
            start_date: parse_date_param("startDate", self.start_date.as_deref())?,
            end_date: parse_date_param("endDate", self.end_date.as_deref())?,
            project_id: parse_id_param("projectId", self.project_id.as_deref())?,
            tx_type: non_empty(self.tx_type.as_deref())
                .map(str::parse::<TransactionType>)
                .transpose()
                .map_err(|e| AppError::bad_request(&e))?,
            category_id: parse_id_param("categoryId", self.category_id.as_deref())?,
            payment_method: non_empty(self.payment_method.as_deref()).map(str::to_string),
            status: self.status.as_deref().map(parse_list).unwrap_or_default(),
            group_by: non_empty(self.group_by.as_deref())
                .map(str::parse::<GroupBy>)
                .transpose()
                .map_err(|e| AppError::bad_request(&e))?,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date_param(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match non_empty(value) {
        None => Ok(None),
        Some(s) => parse_filter_date(s).map(Some).ok_or_else(|| {
            AppError::bad_request(&format!("Invalid {} '{}' (use YYYY-MM-DD)", name, s))
        }),
    }
}

fn parse_id_param(name: &str, value: Option<&str>) -> Result<Option<i64>, AppError> {
    match non_empty(value) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| AppError::bad_request(&format!("Invalid {} '{}'", name, s))),
    }
}

fn parse_kind(kind: &str) -> Result<ReportKind, AppError> {
    kind.parse().map_err(|e: String| AppError::not_found(&e))
}

/// Date window used by GET requests that omit dates
///
/// The transaction summary covers today; every other report the trailing
/// 30 days.
pub fn default_window(kind: ReportKind, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match kind {
        ReportKind::TransactionSummary => (today, today),
        _ => (today - Duration::days(30), today),
    }
}

/// POST /api/reports/:kind - Generate a report from a JSON filter body
pub async fn post_report(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    payload: Result<Json<ReportFilters>, JsonRejection>,
) -> Result<Json<ReportResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let Json(filters) = payload.map_err(|e| AppError::bad_request(&e.body_text()))?;

    run_report(&state, kind, filters).await
}

/// GET /api/reports/:kind - Generate a report from query parameters
///
/// Missing dates fall back to [`default_window`].
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ReportResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let Query(query) = query.map_err(|e| AppError::bad_request(&e.body_text()))?;
    let mut filters = query.into_filters()?;

    let (default_start, default_end) = default_window(kind, Utc::now().date_naive());
    filters.start_date.get_or_insert(default_start);
    filters.end_date.get_or_insert(default_end);

    run_report(&state, kind, filters).await
}

async fn run_report(
    state: &AppState,
    kind: ReportKind,
    filters: ReportFilters,
) -> Result<Json<ReportResponse>, AppError> {
    let started = Instant::now();
    filters
        .require_range()
        .map_err(|e| AppError::bad_request(&e.to_string()))?;

    let key = kind.cache_key(&filters);

    let (report, cached) = match state.cache.get::<Report>(&key).await {
        Some(report) if report.kind() == kind => (report, true),
        _ => {
            let report = state.reports.generate(kind, &filters).await?;
            let ttl = kind.ttl(&filters, Utc::now().date_naive());
            state.cache.set(&key, &report, ttl).await;
            (report, false)
        }
    };

    let latency = started.elapsed().as_millis() as u64;
    debug!(kind = %kind, key = %key, cached, latency, "Served report");

    Ok(Json(ReportResponse {
        success: true,
        metadata: ReportMetadata {
            filters,
            generated_at: Utc::now(),
            record_count: report.record_count(),
            cached,
            latency,
        },
        data: report,
    }))
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub success: bool,
    pub key: String,
}

/// DELETE /api/reports/:kind/cache - Drop the cached report for a filter set
pub async fn invalidate_report(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    payload: Result<Json<ReportFilters>, JsonRejection>,
) -> Result<Json<InvalidateResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let Json(filters) = payload.map_err(|e| AppError::bad_request(&e.body_text()))?;

    let key = kind.cache_key(&filters);
    state.cache.del(&key).await;
    info!(kind = %kind, key = %key, "Invalidated cached report");

    Ok(Json(InvalidateResponse { success: true, key }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_window() {
        let today = date(2024, 3, 15);
        assert_eq!(
            default_window(ReportKind::TransactionSummary, today),
            (today, today)
        );
        assert_eq!(
            default_window(ReportKind::ProfitLoss, today),
            (date(2024, 2, 14), today)
        );
    }

    #[test]
    fn test_query_into_filters() {
        let query = ReportQuery {
            start_date: Some("2024-01-01".into()),
            end_date: Some("".into()),
            project_id: Some("12".into()),
            tx_type: Some("expense".into()),
            status: Some("approved, pending,".into()),
            group_by: Some("week".into()),
            ..Default::default()
        };
        let filters = query.into_filters().ok().unwrap();

        assert_eq!(filters.start_date, Some(date(2024, 1, 1)));
        assert_eq!(filters.end_date, None);
        assert_eq!(filters.project_id, Some(12));
        assert_eq!(filters.tx_type, Some(TransactionType::Expense));
        assert_eq!(filters.status, vec!["approved", "pending"]);
        assert_eq!(filters.group_by, Some(GroupBy::Week));
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let bad_id = ReportQuery {
            project_id: Some("twelve".into()),
            ..Default::default()
        };
        assert!(bad_id.into_filters().is_err());

        let bad_group = ReportQuery {
            group_by: Some("fortnight".into()),
            ..Default::default()
        };
        assert!(bad_group.into_filters().is_err());
    }
}
