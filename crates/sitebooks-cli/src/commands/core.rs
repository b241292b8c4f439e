//! Core command implementations and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use sitebooks_core::Database;

/// Open (and migrate) the database at `db_path`
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let transactions = db.count_transactions()?;
    println!("   Schema up to date ({} transactions)", transactions);

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a project: sitebooks projects add \"Riverside Extension\"");
    println!("  2. Record a transaction: sitebooks transactions add --type income --amount 1200");
    println!("  3. Start the API: sitebooks serve");

    Ok(())
}
