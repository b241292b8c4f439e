//! Server command implementation

use std::path::Path;

use anyhow::Result;
use sitebooks_core::CacheClient;
use sitebooks_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    let cache = CacheClient::from_env();
    let config = ServerConfig::from_env();

    println!("🚀 Starting Sitebooks web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if cache.is_configured() {
        println!("   🗄️  Report cache: {}", cache.name());
    } else {
        println!("   ⚠️  Report cache disabled (set SITEBOOKS_CACHE_URL and SITEBOOKS_CACHE_TOKEN)");
    }
    if config.cron_secret.is_some() {
        println!("   ⏰ Cache warm route enabled (SITEBOOKS_CRON_SECRET)");
    }
    if !config.allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} (SITEBOOKS_ALLOWED_ORIGINS)",
            config.allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;
    sitebooks_server::serve_with_config(db, cache, host, port, config).await?;

    Ok(())
}
