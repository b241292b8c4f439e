//! Bookkeeping commands: projects, categories and transactions

use anyhow::{Context, Result};
use chrono::Utc;
use sitebooks_core::models::{parse_filter_date, NewProject, NewTransaction};
use sitebooks_core::{Database, TransactionType};

use super::{money, truncate};

fn parse_type(s: &str) -> Result<TransactionType> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

// ========== Projects ==========

pub fn cmd_projects_list(db: &Database) -> Result<()> {
    let projects = db.list_projects()?;

    if projects.is_empty() {
        println!("No projects yet. Add one with:");
        println!("  sitebooks projects add \"Project name\" --client \"Client\"");
        return Ok(());
    }

    println!();
    println!("🏗️  Projects");
    println!("   ─────────────────────────────────────────────────────────────");

    for project in projects {
        println!(
            "   {:>4} │ {:30} │ {}",
            project.id,
            truncate(&project.name, 30),
            project.client.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub fn cmd_projects_add(db: &Database, name: &str, client: Option<&str>) -> Result<i64> {
    let id = db.create_project(&NewProject {
        name: name.to_string(),
        client: client.map(str::to_string),
    })?;

    println!("✅ Created project '{}' (id {})", name.trim(), id);
    Ok(id)
}

// ========== Categories ==========

pub fn cmd_categories_list(db: &Database, kind: Option<&str>) -> Result<()> {
    let kind = kind.map(parse_type).transpose()?;
    let categories = db.list_categories(kind)?;

    if categories.is_empty() {
        println!("No categories found.");
        return Ok(());
    }

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");

    for category in categories {
        println!(
            "   {:>4} │ {:8} │ {}",
            category.id,
            category.kind.as_str(),
            category.name
        );
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str, kind: &str) -> Result<i64> {
    let kind = parse_type(kind)?;
    let id = db.create_category(name, kind)?;

    println!("✅ Category '{}' ({}) has id {}", name.trim(), kind, id);
    Ok(id)
}

// ========== Transactions ==========

/// Arguments for `transactions add`
pub struct TransactionInput<'a> {
    pub tx_type: &'a str,
    pub amount: f64,
    pub date: Option<&'a str>,
    pub project_id: Option<i64>,
    pub category_id: Option<i64>,
    pub source: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

pub fn cmd_transactions_add(db: &Database, input: TransactionInput<'_>) -> Result<i64> {
    let tx_type = parse_type(input.tx_type)?;
    let date = match input.date {
        Some(s) => parse_filter_date(s).context("Invalid --date format (use YYYY-MM-DD)")?,
        None => Utc::now().date_naive(),
    };

    let tx = NewTransaction {
        project_id: input.project_id,
        category_id: input.category_id,
        source: input.source,
        payment_method: input.payment_method,
        status: input.status,
        description: input.description,
        ..NewTransaction::new(tx_type, input.amount, date)
    };
    let id = db.insert_transaction(&tx)?;

    println!(
        "✅ Recorded {} of {} on {} (id {})",
        tx_type,
        money(input.amount),
        date,
        id
    );
    println!("   Cached reports covering this date refresh when their TTL expires.");

    Ok(id)
}

pub fn cmd_transactions_list(db: &Database, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(limit, 0)?;

    if transactions.is_empty() {
        println!("No transactions found. Record one with:");
        println!("  sitebooks transactions add --type expense --amount 250 --description \"Timber\"");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        // Red for expenses, green for income
        let amount_str = match tx.tx_type {
            TransactionType::Expense => format!("\x1b[31m-{}\x1b[0m", money(tx.amount)),
            TransactionType::Income => format!("\x1b[32m+{}\x1b[0m", money(tx.amount)),
        };

        let label = tx
            .description
            .as_deref()
            .or(tx.source.as_deref())
            .or(tx.category_name.as_deref())
            .unwrap_or("-");

        println!(
            "   {} │ {:>22} │ {:10} │ {:20} │ {}",
            tx.date,
            amount_str,
            truncate(&tx.status, 10),
            truncate(tx.project_name.as_deref().unwrap_or("-"), 20),
            truncate(label, 30)
        );
    }

    Ok(())
}
