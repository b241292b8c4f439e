//! Report cache warming
//!
//! Pre-computes the reports most dashboards open with so the first request
//! of the day is a cache hit. The same routine backs the cron route, the
//! `sitebooks warm` command and an optional in-process timer enabled via:
//!
//! - `SITEBOOKS_CACHE_WARM_MINUTES`: Interval in minutes (e.g., "15")

use std::time::Duration;

use chrono::{Datelike, Duration as DateDuration, NaiveDate, Utc};
use serde::Serialize;
use tokio::time::interval;
use tracing::{info, warn};

use sitebooks_core::{CacheClient, ReportFilters, ReportKind, ReportService};

/// Configuration for the background cache warmer
#[derive(Debug, Clone)]
pub struct CacheWarmConfig {
    /// Interval between warm runs in minutes
    pub interval_minutes: u64,
}

impl CacheWarmConfig {
    /// Parse configuration from environment variables
    ///
    /// Returns None if warming is not configured (SITEBOOKS_CACHE_WARM_MINUTES not set)
    pub fn from_env() -> Option<Self> {
        let interval_minutes: u64 = std::env::var("SITEBOOKS_CACHE_WARM_MINUTES")
            .ok()
            .and_then(|s| s.trim().parse().ok())?;

        if interval_minutes == 0 {
            warn!("SITEBOOKS_CACHE_WARM_MINUTES is 0, background cache warming disabled");
            return None;
        }

        Some(Self { interval_minutes })
    }
}

/// Outcome of warming one report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmResult {
    pub report: ReportKind,
    pub key: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Reports to pre-compute, relative to `today`
///
/// - profit & loss: current month to date, last month, year to date
/// - cash flow: current month to date
/// - transaction summary: today
pub fn warm_targets(today: NaiveDate) -> Vec<(ReportKind, ReportFilters)> {
    let this_month = month_start(today);
    let last_month_end = this_month - DateDuration::days(1);
    let last_month = month_start(last_month_end);
    let year_start = today.with_ordinal(1).unwrap_or(today);

    vec![
        (ReportKind::ProfitLoss, ReportFilters::for_range(this_month, today)),
        (ReportKind::ProfitLoss, ReportFilters::for_range(last_month, last_month_end)),
        (ReportKind::ProfitLoss, ReportFilters::for_range(year_start, today)),
        (ReportKind::CashFlow, ReportFilters::for_range(this_month, today)),
        (ReportKind::TransactionSummary, ReportFilters::for_range(today, today)),
    ]
}

/// Generate every warm target and store it under its cache key
///
/// A failing report is recorded and skipped; the rest still run.
pub async fn warm_report_cache(
    reports: &ReportService,
    cache: &CacheClient,
    today: NaiveDate,
) -> Vec<WarmResult> {
    let mut results = Vec::new();

    for (kind, filters) in warm_targets(today) {
        let key = kind.cache_key(&filters);

        match reports.generate(kind, &filters).await {
            Ok(report) => {
                cache.set(&key, &report, kind.ttl(&filters, today)).await;
                results.push(WarmResult {
                    report: kind,
                    key,
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                warn!(kind = %kind, key = %key, error = %e, "Failed to warm report");
                results.push(WarmResult {
                    report: kind,
                    key,
                    success: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    results
}

/// Start the cache warmer as a background task
///
/// The first run happens immediately, then every configured interval.
pub fn start_cache_warmer(reports: ReportService, cache: CacheClient, config: CacheWarmConfig) {
    info!(
        "Starting cache warmer: every {} minutes ({} backend)",
        config.interval_minutes,
        cache.name()
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.interval_minutes * 60));

        loop {
            ticker.tick().await;

            let results = warm_report_cache(&reports, &cache, Utc::now().date_naive()).await;
            let failed = results.iter().filter(|r| !r.success).count();
            if failed == 0 {
                info!("Scheduled cache warm completed: {} reports", results.len());
            } else {
                warn!(
                    "Scheduled cache warm finished with {} of {} reports failing",
                    failed,
                    results.len()
                );
            }
        }
    });
}
