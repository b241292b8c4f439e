//! Report command implementations

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sitebooks_core::models::parse_filter_date;
use sitebooks_core::reports::{
    CashFlowReport, ExpenseCategoryReport, IncomeSourceReport, ProfitLossReport,
    TransactionSummaryReport,
};
use sitebooks_core::{Database, GroupBy, Report, ReportFilters, ReportKind, ReportService};

use super::{money, truncate};

/// Resolve a period string to (from_date, to_date) relative to today
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
) -> Result<(NaiveDate, NaiveDate)> {
    resolve_period_at(period, custom_from, custom_to, Utc::now().date_naive())
}

pub(crate) fn resolve_period_at(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    // If custom dates provided, use those
    match (custom_from, custom_to) {
        (Some(from), Some(to)) => {
            let from_date =
                parse_filter_date(from).context("Invalid --from date format (use YYYY-MM-DD)")?;
            let to_date =
                parse_filter_date(to).context("Invalid --to date format (use YYYY-MM-DD)")?;
            return Ok((from_date, to_date));
        }
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("--from and --to must be given together")
        }
        (None, None) => {}
    }

    let month_start = today.with_day(1).unwrap_or(today);

    match period.to_lowercase().as_str() {
        "today" => Ok((today, today)),
        "this-month" => Ok((month_start, today)),
        "last-month" => {
            let last_day = month_start - Duration::days(1);
            Ok((last_day.with_day(1).unwrap_or(last_day), last_day))
        }
        "this-year" => Ok((today.with_ordinal(1).unwrap_or(today), today)),
        "last-30-days" => Ok((today - Duration::days(30), today)),
        "last-90-days" => Ok((today - Duration::days(90), today)),
        "all" => {
            let from = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(today);
            Ok((from, today))
        }
        _ => anyhow::bail!(
            "Unknown period: {}. Available: today, this-month, last-month, this-year, last-30-days, last-90-days, all",
            period
        ),
    }
}

/// Optional knobs for `sitebooks report`
#[derive(Debug, Default)]
pub struct ReportOptions<'a> {
    pub group_by: Option<&'a str>,
    pub project_id: Option<i64>,
    pub json: bool,
}

/// Compute a report straight from the database and print it
///
/// The CLI always reads fresh data; the cache is only used by the server.
pub async fn cmd_report(
    db: &Database,
    kind: &str,
    from: NaiveDate,
    to: NaiveDate,
    options: ReportOptions<'_>,
) -> Result<()> {
    generate_report(db, kind, from, to, &options).await.map(|_| ())
}

pub(crate) async fn generate_report(
    db: &Database,
    kind: &str,
    from: NaiveDate,
    to: NaiveDate,
    options: &ReportOptions<'_>,
) -> Result<Report> {
    let kind: ReportKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut filters = ReportFilters::for_range(from, to);
    filters.project_id = options.project_id;
    if let Some(group_by) = options.group_by {
        let group_by: GroupBy = group_by.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        filters = filters.with_group_by(group_by);
    }
    filters.require_range()?;

    let report = ReportService::new(db.clone())
        .generate(kind, &filters)
        .await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    println!();
    println!("📊 {}", title(kind));
    println!("   Period: {} to {}", from, to);
    println!("   ─────────────────────────────────────────────────────────────");

    if report.record_count() == 0 {
        println!("   No transactions found in this period.");
        return Ok(report);
    }

    match &report {
        Report::ProfitLoss(r) => print_profit_loss(r),
        Report::CashFlow(r) => print_cash_flow(r),
        Report::IncomeSource(r) => print_income_sources(r),
        Report::ExpenseCategory(r) => print_expense_categories(r),
        Report::TransactionSummary(r) => print_transaction_summary(r),
    }

    Ok(report)
}

fn title(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::ProfitLoss => "Profit & Loss",
        ReportKind::CashFlow => "Cash Flow",
        ReportKind::IncomeSource => "Income Sources",
        ReportKind::ExpenseCategory => "Expense Categories",
        ReportKind::TransactionSummary => "Transaction Summary",
    }
}

fn print_share_row(label: &str, amount: f64, percentage: f64, count: usize) {
    println!(
        "   {:25} │ {:>14} │ {:>6.1}% │ {:>5}",
        truncate(label, 25),
        money(amount),
        percentage,
        count
    );
}

fn print_share_header(label: &str) {
    println!(
        "   {:25} │ {:>14} │ {:>7} │ {:>5}",
        label, "Amount", "%", "Count"
    );
    println!("   ──────────────────────────┼────────────────┼─────────┼───────");
}

fn print_profit_loss(r: &ProfitLossReport) {
    println!("   Income:  {}", money(r.summary.total_income));
    println!("   Expense: {}", money(r.summary.total_expense));
    println!(
        "   Net:     {} ({:.1}% margin)",
        money(r.summary.net_profit),
        r.summary.profit_margin
    );

    println!();
    println!(
        "   {:10} │ {:>14} │ {:>14} │ {:>14}",
        "Period", "Income", "Expense", "Net"
    );
    for row in &r.breakdown {
        println!(
            "   {:10} │ {:>14} │ {:>14} │ {:>14}",
            row.period,
            money(row.income),
            money(row.expense),
            money(row.net)
        );
    }

    for (label, rows) in [("Income", &r.by_category.income), ("Expense", &r.by_category.expense)] {
        if rows.is_empty() {
            continue;
        }
        println!();
        print_share_header(&format!("{} category", label));
        for c in rows {
            print_share_row(&c.category, c.amount, c.percentage, c.count);
        }
    }
}

fn print_cash_flow(r: &CashFlowReport) {
    println!("   Inflow:  {}", money(r.summary.total_inflow));
    println!("   Outflow: {}", money(r.summary.total_outflow));
    println!("   Net:     {}", money(r.summary.net_cash_flow));
    println!(
        "   Balance: {} → {}",
        money(r.summary.opening_balance),
        money(r.summary.closing_balance)
    );

    println!();
    println!(
        "   {:10} │ {:>14} │ {:>14} │ {:>14}",
        "Period", "Inflow", "Outflow", "Cumulative"
    );
    for p in &r.periods {
        println!(
            "   {:10} │ {:>14} │ {:>14} │ {:>14}",
            p.period,
            money(p.inflow),
            money(p.outflow),
            money(p.cumulative)
        );
    }

    println!();
    println!(
        "   {:20} │ {:>14} │ {:>14} │ {:>5}",
        "Payment method", "Inflow", "Outflow", "Count"
    );
    for m in &r.by_payment_method {
        println!(
            "   {:20} │ {:>14} │ {:>14} │ {:>5}",
            truncate(&m.payment_method, 20),
            money(m.inflow),
            money(m.outflow),
            m.count
        );
    }
}

fn print_income_sources(r: &IncomeSourceReport) {
    println!(
        "   Total: {} from {} sources ({} transactions, avg {})",
        money(r.summary.total_income),
        r.summary.source_count,
        r.summary.transaction_count,
        money(r.summary.average_transaction)
    );

    println!();
    print_share_header("Source");
    for s in &r.by_source {
        print_share_row(&s.source, s.amount, s.percentage, s.count);
    }

    println!();
    print_share_header("Category");
    for c in &r.by_category {
        print_share_row(&c.category, c.amount, c.percentage, c.count);
    }
}

fn print_expense_categories(r: &ExpenseCategoryReport) {
    println!(
        "   Total: {} across {} categories ({} transactions, avg {})",
        money(r.summary.total_expense),
        r.summary.category_count,
        r.summary.transaction_count,
        money(r.summary.average_transaction)
    );

    println!();
    print_share_header("Category");
    for c in &r.by_category {
        print_share_row(&c.category, c.amount, c.percentage, c.count);
    }

    println!();
    print_share_header("Payment method");
    for m in &r.by_payment_method {
        print_share_row(&m.payment_method, m.amount, m.percentage, m.count);
    }
}

fn print_transaction_summary(r: &TransactionSummaryReport) {
    let s = &r.summary;
    println!(
        "   Transactions: {} ({} income, {} expense)",
        s.total_transactions, s.income_count, s.expense_count
    );
    println!(
        "   Income:  {} (avg {})",
        money(s.total_income),
        money(s.average_income)
    );
    println!(
        "   Expense: {} (avg {})",
        money(s.total_expense),
        money(s.average_expense)
    );
    println!("   Net:     {}", money(s.net_amount));

    println!();
    println!("   {:15} │ {:>5} │ {:>14}", "Status", "Count", "Amount");
    for status in &r.by_status {
        println!(
            "   {:15} │ {:>5} │ {:>14}",
            truncate(&status.status, 15),
            status.count,
            money(status.amount)
        );
    }

    println!();
    println!(
        "   {:25} │ {:>14} │ {:>14} │ {:>14}",
        "Project", "Income", "Expense", "Net"
    );
    for p in &r.by_project {
        println!(
            "   {:25} │ {:>14} │ {:>14} │ {:>14}",
            truncate(&p.project, 25),
            money(p.income),
            money(p.expense),
            money(p.net)
        );
    }
}
