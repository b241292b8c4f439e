//! Cache warm command

use anyhow::Result;
use chrono::Utc;
use sitebooks_core::{CacheClient, Database, ReportService};
use tracing::{info, warn};

/// Whether entries written by this process outlive it
///
/// The in-process memory cache is dropped on exit, so a one-shot warm
/// against it stores nothing a server could read.
pub(crate) fn outlives_process(cache: &CacheClient) -> bool {
    cache.is_configured() && !matches!(cache, CacheClient::Memory(_))
}

pub async fn cmd_warm(db: &Database, cache: &CacheClient) -> Result<()> {
    let persistent = outlives_process(cache);
    if !persistent {
        println!(
            "⚠️  Cache backend '{}' does not persist; reports will be computed but not stored.",
            cache.name()
        );
        println!("   Set SITEBOOKS_CACHE_URL and SITEBOOKS_CACHE_TOKEN to warm a shared cache.");
    }

    println!("🔥 Warming report cache ({} backend)...", cache.name());

    let reports = ReportService::new(db.clone());
    let results =
        sitebooks_server::warm_report_cache(&reports, cache, Utc::now().date_naive()).await;

    for result in &results {
        match &result.error {
            None => println!("   ✓ {:20} {}", result.report.as_str(), result.key),
            Some(e) => println!("   ✗ {:20} {}", result.report.as_str(), e),
        }
    }

    let failed = results.iter().filter(|r| !r.success).count();
    println!();
    if failed > 0 {
        warn!(failed, total = results.len(), "Cache warm finished with failures");
        anyhow::bail!("{} of {} reports failed to warm", failed, results.len())
    }

    info!(
        reports = results.len(),
        backend = cache.name(),
        persistent,
        "Cache warm finished"
    );
    if persistent {
        println!("✅ Warmed {} reports", results.len());
    } else {
        println!("✅ Computed {} reports (nothing stored)", results.len());
    }
    Ok(())
}
