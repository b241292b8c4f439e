//! CLI command tests

use chrono::NaiveDate;
use sitebooks_core::{CacheClient, Database, MemoryCache, Report, TransactionType};

use crate::commands::{self, money, truncate, ReportOptions, TransactionInput};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn add_tx(db: &Database, tx_type: &str, amount: f64, on: &str) -> i64 {
    commands::cmd_transactions_add(
        db,
        TransactionInput {
            tx_type,
            amount,
            date: Some(on),
            project_id: None,
            category_id: None,
            source: None,
            payment_method: None,
            status: None,
            description: None,
        },
    )
    .unwrap()
}

// ========== Formatting Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("Riverside Extension", 10), "Riversi...");
    assert_eq!(truncate("Übergrößenträger", 6), "Übe...");
}

#[test]
fn test_money() {
    assert_eq!(money(0.0), "$0.00");
    assert_eq!(money(999.5), "$999.50");
    assert_eq!(money(1234567.891), "$1,234,567.89");
    assert_eq!(money(-2500.0), "-$2,500.00");
}

// ========== Period Resolution Tests ==========

#[test]
fn test_resolve_period_named() {
    let today = date(2024, 3, 15);
    let resolve = |p: &str| commands::resolve_period_at(p, None, None, today).unwrap();

    assert_eq!(resolve("today"), (today, today));
    assert_eq!(resolve("this-month"), (date(2024, 3, 1), today));
    assert_eq!(resolve("last-month"), (date(2024, 2, 1), date(2024, 2, 29)));
    assert_eq!(resolve("This-Year"), (date(2024, 1, 1), today));
    assert_eq!(resolve("last-30-days"), (date(2024, 2, 14), today));
    assert_eq!(resolve("all"), (date(2000, 1, 1), today));
}

#[test]
fn test_resolve_period_last_month_in_january() {
    let today = date(2024, 1, 10);
    let range = commands::resolve_period_at("last-month", None, None, today).unwrap();
    assert_eq!(range, (date(2023, 12, 1), date(2023, 12, 31)));
}

#[test]
fn test_resolve_period_custom_range() {
    let today = date(2024, 3, 15);
    let range =
        commands::resolve_period_at("this-month", Some("2023-06-01"), Some("2023-06-30"), today)
            .unwrap();
    assert_eq!(range, (date(2023, 6, 1), date(2023, 6, 30)));
}

#[test]
fn test_resolve_period_rejects_bad_input() {
    let today = date(2024, 3, 15);
    assert!(commands::resolve_period_at("fortnight", None, None, today).is_err());
    assert!(commands::resolve_period_at("all", Some("2024-01-01"), None, today).is_err());
    assert!(
        commands::resolve_period_at("all", Some("01/01/2024"), Some("2024-02-01"), today).is_err()
    );
}

// ========== Data Command Tests ==========

#[test]
fn test_open_db_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.db");

    commands::cmd_init(&path).unwrap();
    assert!(path.exists());

    // Reopening runs migrations again without error
    let db = commands::open_db(&path).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 0);
}

#[test]
fn test_cmd_projects_add_and_list() {
    let db = setup_test_db();
    let id = commands::cmd_projects_add(&db, "Harbour Deck", Some("Marina Ltd")).unwrap();

    let project = db.get_project(id).unwrap().unwrap();
    assert_eq!(project.name, "Harbour Deck");
    assert_eq!(project.client.as_deref(), Some("Marina Ltd"));
    assert!(commands::cmd_projects_list(&db).is_ok());
}

#[test]
fn test_cmd_categories_add() {
    let db = setup_test_db();
    let id = commands::cmd_categories_add(&db, "Materials", "expense").unwrap();

    let category = db.get_category(id).unwrap().unwrap();
    assert_eq!(category.kind, TransactionType::Expense);
    assert!(commands::cmd_categories_list(&db, Some("expense")).is_ok());
    assert!(commands::cmd_categories_list(&db, Some("salary")).is_err());
    assert!(commands::cmd_categories_add(&db, "Labour", "transfer").is_err());
}

#[test]
fn test_cmd_transactions_add_and_list() {
    let db = setup_test_db();
    let project_id = commands::cmd_projects_add(&db, "Riverside", None).unwrap();

    let id = commands::cmd_transactions_add(
        &db,
        TransactionInput {
            tx_type: "income",
            amount: 1200.0,
            date: Some("2024-01-05"),
            project_id: Some(project_id),
            category_id: None,
            source: Some("Riverside Council".into()),
            payment_method: Some("bank-transfer".into()),
            status: Some("approved".into()),
            description: None,
        },
    )
    .unwrap();

    let tx = db.get_transaction(id).unwrap().unwrap();
    assert_eq!(tx.tx_type, TransactionType::Income);
    assert_eq!(tx.date, date(2024, 1, 5));
    assert_eq!(tx.project_name.as_deref(), Some("Riverside"));
    assert_eq!(tx.status, "approved");

    assert!(commands::cmd_transactions_list(&db, 10).is_ok());
}

#[test]
fn test_cmd_transactions_add_rejects_bad_input() {
    let db = setup_test_db();
    let input = |tx_type, amount, date| TransactionInput {
        tx_type,
        amount,
        date,
        project_id: None,
        category_id: None,
        source: None,
        payment_method: None,
        status: None,
        description: None,
    };

    assert!(commands::cmd_transactions_add(&db, input("refund", 10.0, None)).is_err());
    assert!(commands::cmd_transactions_add(&db, input("expense", 10.0, Some("5 Jan"))).is_err());
    assert!(commands::cmd_transactions_add(&db, input("expense", -10.0, None)).is_err());
    assert_eq!(db.count_transactions().unwrap(), 0);
}

// ========== Report Command Tests ==========

#[tokio::test]
async fn test_generate_profit_loss_report() {
    let db = setup_test_db();
    add_tx(&db, "income", 1000.0, "2024-01-05");
    add_tx(&db, "expense", 400.0, "2024-01-20");

    let report = commands::generate_report(
        &db,
        "pnl",
        date(2024, 1, 1),
        date(2024, 1, 31),
        &ReportOptions::default(),
    )
    .await
    .unwrap();

    let Report::ProfitLoss(pnl) = report else {
        panic!("expected a profit & loss report");
    };
    assert_eq!(pnl.summary.net_profit, 600.0);
    assert_eq!(pnl.summary.profit_margin, 60.0);
}

#[tokio::test]
async fn test_generate_report_with_options() {
    let db = setup_test_db();
    add_tx(&db, "income", 1000.0, "2024-01-05");
    add_tx(&db, "expense", 300.0, "2024-02-10");

    let options = ReportOptions {
        group_by: Some("quarter"),
        project_id: None,
        json: true,
    };
    let report = commands::generate_report(
        &db,
        "cash-flow",
        date(2024, 1, 1),
        date(2024, 3, 31),
        &options,
    )
    .await
    .unwrap();

    let Report::CashFlow(flow) = report else {
        panic!("expected a cash flow report");
    };
    assert_eq!(flow.periods.len(), 1);
    assert_eq!(flow.periods[0].period, "2024-Q1");
    assert_eq!(flow.summary.closing_balance, 700.0);
}

#[tokio::test]
async fn test_report_rejects_unknown_kind_and_grouping() {
    let db = setup_test_db();
    let (from, to) = (date(2024, 1, 1), date(2024, 1, 31));

    assert!(commands::cmd_report(&db, "balance-sheet", from, to, ReportOptions::default())
        .await
        .is_err());

    let options = ReportOptions {
        group_by: Some("fortnight"),
        ..Default::default()
    };
    assert!(commands::cmd_report(&db, "profit-loss", from, to, options)
        .await
        .is_err());
}

#[tokio::test]
async fn test_report_rejects_reversed_range() {
    let db = setup_test_db();
    let result = commands::cmd_report(
        &db,
        "summary",
        date(2024, 2, 1),
        date(2024, 1, 1),
        ReportOptions::default(),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_warm_fills_cache() {
    let db = setup_test_db();
    let memory = MemoryCache::new();

    commands::cmd_warm(&db, &CacheClient::Memory(memory.clone()))
        .await
        .unwrap();
    assert_eq!(memory.len().await, 5);
}

#[test]
fn test_warm_only_persists_to_shared_cache() {
    assert!(!commands::outlives_process(&CacheClient::memory()));
    assert!(!commands::outlives_process(&CacheClient::disabled()));
    assert!(commands::outlives_process(&CacheClient::rest(
        "http://127.0.0.1:6380",
        "token"
    )));
}
