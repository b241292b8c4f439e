//! CLI argument definitions using clap
//!
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sitebooks - Financial reports for construction projects
#[derive(Parser)]
#[command(name = "sitebooks")]
#[command(about = "Cached financial reporting for construction project books", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "sitebooks.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate a report and print it
    Report {
        /// Report type (profit-loss, cash-flow, income-source, expense-category, summary)
        kind: String,

        /// Period: today, this-month, last-month, this-year, last-30-days, last-90-days, all
        #[arg(short, long, default_value = "this-month")]
        period: String,

        /// Custom start date (YYYY-MM-DD), requires --to
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD), requires --from
        #[arg(long)]
        to: Option<String>,

        /// Grouping granularity: day, week, month, quarter, year
        #[arg(short, long)]
        group_by: Option<String>,

        /// Restrict to one project ID
        #[arg(long)]
        project: Option<i64>,

        /// Print the raw JSON report instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Pre-compute the commonly requested reports into the cache
    Warm,

    /// Manage projects (list, add)
    Projects {
        #[command(subcommand)]
        action: Option<ProjectsAction>,
    },

    /// Manage categories (list, add)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage transactions (list, add)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },
}

#[derive(Subcommand)]
pub enum ProjectsAction {
    /// List all projects
    List,

    /// Add a project
    Add {
        /// Project name
        name: String,

        /// Client the project is for
        #[arg(long)]
        client: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List {
        /// Only show one kind: income or expense
        #[arg(long)]
        kind: Option<String>,
    },

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Kind: income or expense
        #[arg(long, default_value = "expense")]
        kind: String,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Record a transaction
    Add {
        /// Type: income or expense
        #[arg(long = "type")]
        tx_type: String,

        /// Amount (positive)
        #[arg(long)]
        amount: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Project ID
        #[arg(long)]
        project: Option<i64>,

        /// Category ID
        #[arg(long)]
        category: Option<i64>,

        /// Income source (e.g., client name)
        #[arg(long)]
        source: Option<String>,

        /// Payment method (e.g., bank-transfer, card, cash)
        #[arg(long)]
        payment_method: Option<String>,

        /// Workflow status (defaults to pending)
        #[arg(long)]
        status: Option<String>,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },
}
