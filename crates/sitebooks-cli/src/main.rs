//! Sitebooks CLI - Financial reports for construction projects
//!
//! Usage:
//!   sitebooks init                          Initialize database
//!   sitebooks transactions add --type ...   Record a transaction
//!   sitebooks report profit-loss            Print a report
//!   sitebooks serve --port 3000             Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve { port, host } => commands::cmd_serve(&cli.db, &host, port).await,
        Commands::Report {
            kind,
            period,
            from,
            to,
            group_by,
            project,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            let (from_date, to_date) =
                commands::resolve_period(&period, from.as_deref(), to.as_deref())?;
            let options = commands::ReportOptions {
                group_by: group_by.as_deref(),
                project_id: project,
                json,
            };
            commands::cmd_report(&db, &kind, from_date, to_date, options).await
        }
        Commands::Warm => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_warm(&db, &sitebooks_core::CacheClient::from_env()).await
        }
        Commands::Projects { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(ProjectsAction::List) => commands::cmd_projects_list(&db),
                Some(ProjectsAction::Add { name, client }) => {
                    commands::cmd_projects_add(&db, &name, client.as_deref()).map(|_| ())
                }
            }
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_categories_list(&db, None),
                Some(CategoriesAction::List { kind }) => {
                    commands::cmd_categories_list(&db, kind.as_deref())
                }
                Some(CategoriesAction::Add { name, kind }) => {
                    commands::cmd_categories_add(&db, &name, &kind).map(|_| ())
                }
            }
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_transactions_list(&db, 20),
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&db, limit)
                }
                Some(TransactionsAction::Add {
                    tx_type,
                    amount,
                    date,
                    project,
                    category,
                    source,
                    payment_method,
                    status,
                    description,
                }) => commands::cmd_transactions_add(
                    &db,
                    commands::TransactionInput {
                        tx_type: &tx_type,
                        amount,
                        date: date.as_deref(),
                        project_id: project,
                        category_id: category,
                        source,
                        payment_method,
                        status,
                        description,
                    },
                )
                .map(|_| ()),
            }
        }
    }
}
