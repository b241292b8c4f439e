//! Report generation
//!
//! Each generator reads the matching transactions once and derives every
//! figure from that list. Database errors propagate to the caller untouched.

use tracing::debug;

use super::grouping::{
    calculate_percentages, group_by_field, group_by_period, sort_by_amount_desc, GroupedBucket,
    TransactionField,
};
use super::types::*;
use crate::db::Database;
use crate::error::Result;
use crate::models::{NormalizedTransaction, ReportFilters, TransactionType};

/// Generates reports from the transaction store
#[derive(Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Generate any report kind
    pub async fn generate(&self, kind: ReportKind, filters: &ReportFilters) -> Result<Report> {
        let report = match kind {
            ReportKind::ProfitLoss => Report::ProfitLoss(self.profit_and_loss(filters).await?),
            ReportKind::CashFlow => Report::CashFlow(self.cash_flow(filters).await?),
            ReportKind::IncomeSource => Report::IncomeSource(self.income_sources(filters).await?),
            ReportKind::ExpenseCategory => {
                Report::ExpenseCategory(self.expense_categories(filters).await?)
            }
            ReportKind::TransactionSummary => {
                Report::TransactionSummary(self.transaction_summary(filters).await?)
            }
        };

        debug!(kind = %kind, records = report.record_count(), "Generated report");
        Ok(report)
    }

    pub async fn profit_and_loss(&self, filters: &ReportFilters) -> Result<ProfitLossReport> {
        let transactions = self.fetch(filters.clone()).await?;
        Ok(build_profit_loss(&transactions, filters))
    }

    pub async fn cash_flow(&self, filters: &ReportFilters) -> Result<CashFlowReport> {
        let transactions = self.fetch(filters.clone()).await?;
        Ok(build_cash_flow(&transactions, filters))
    }

    /// Income breakdown; the type filter is always forced to income
    pub async fn income_sources(&self, filters: &ReportFilters) -> Result<IncomeSourceReport> {
        let transactions = self
            .fetch(filters.clone().with_type(TransactionType::Income))
            .await?;
        Ok(build_income_sources(&transactions, filters))
    }

    /// Expense breakdown; the type filter is always forced to expense
    pub async fn expense_categories(
        &self,
        filters: &ReportFilters,
    ) -> Result<ExpenseCategoryReport> {
        let transactions = self
            .fetch(filters.clone().with_type(TransactionType::Expense))
            .await?;
        Ok(build_expense_categories(&transactions, filters))
    }

    pub async fn transaction_summary(
        &self,
        filters: &ReportFilters,
    ) -> Result<TransactionSummaryReport> {
        let transactions = self.fetch(filters.clone()).await?;
        Ok(build_transaction_summary(&transactions, filters))
    }

    /// Run the blocking SQLite read off the async executor
    async fn fetch(&self, filters: ReportFilters) -> Result<Vec<NormalizedTransaction>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.query_transactions(&filters)).await?
    }
}

fn sum_where(transactions: &[NormalizedTransaction], tx_type: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.tx_type == tx_type)
        .map(|tx| tx.amount)
        .sum()
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn average(total: f64, count: usize) -> f64 {
    ratio(total, count as f64)
}

fn category_breakdowns<'a, I>(transactions: I, field: TransactionField) -> Vec<CategoryBreakdown>
where
    I: IntoIterator<Item = &'a NormalizedTransaction>,
{
    let items = group_by_field(transactions, field)
        .into_iter()
        .map(|bucket| CategoryBreakdown {
            category: bucket.key,
            amount: bucket.total,
            count: bucket.count,
            percentage: 0.0,
        })
        .collect();

    let mut items = calculate_percentages(items);
    sort_by_amount_desc(&mut items);
    items
}

fn period_amounts(buckets: Vec<GroupedBucket<&NormalizedTransaction>>) -> Vec<PeriodAmount> {
    buckets
        .into_iter()
        .map(|bucket| PeriodAmount {
            period: bucket.key,
            amount: bucket.total,
            count: bucket.count,
        })
        .collect()
}

fn payment_method_flows(transactions: &[NormalizedTransaction]) -> Vec<PaymentMethodFlow> {
    let buckets = group_by_field(transactions, TransactionField::PaymentMethod);
    let mut flows: Vec<PaymentMethodFlow> = buckets
        .into_iter()
        .map(|bucket| {
            let inflow = bucket.income();
            let outflow = bucket.expense();
            PaymentMethodFlow {
                payment_method: bucket.key,
                inflow,
                outflow,
                net: inflow - outflow,
                count: bucket.count,
            }
        })
        .collect();

    flows.sort_by(|a, b| (b.inflow + b.outflow).total_cmp(&(a.inflow + a.outflow)));
    flows
}

pub(crate) fn build_profit_loss(
    transactions: &[NormalizedTransaction],
    filters: &ReportFilters,
) -> ProfitLossReport {
    let total_income = sum_where(transactions, TransactionType::Income);
    let total_expense = sum_where(transactions, TransactionType::Expense);
    let net_profit = total_income - total_expense;

    let breakdown = group_by_period(transactions, filters.group_by())
        .into_iter()
        .map(|bucket| {
            let income = bucket.income();
            let expense = bucket.expense();
            PeriodBreakdown {
                period: bucket.key,
                income,
                expense,
                net: income - expense,
            }
        })
        .collect();

    let by_category = CategorySplit {
        income: category_breakdowns(
            transactions.iter().filter(|tx| tx.is_income()),
            TransactionField::Category,
        ),
        expense: category_breakdowns(
            transactions.iter().filter(|tx| tx.is_expense()),
            TransactionField::ExpenseCategory,
        ),
    };

    ProfitLossReport {
        summary: ProfitLossSummary {
            total_income,
            total_expense,
            net_profit,
            profit_margin: ratio(net_profit, total_income) * 100.0,
        },
        breakdown,
        by_category,
        period: filters.into(),
    }
}

pub(crate) fn build_cash_flow(
    transactions: &[NormalizedTransaction],
    filters: &ReportFilters,
) -> CashFlowReport {
    let opening_balance = 0.0;
    let total_inflow = sum_where(transactions, TransactionType::Income);
    let total_outflow = sum_where(transactions, TransactionType::Expense);
    let net_cash_flow = total_inflow - total_outflow;

    let mut cumulative = opening_balance;
    let periods = group_by_period(transactions, filters.group_by())
        .into_iter()
        .map(|bucket| {
            let inflow = bucket.income();
            let outflow = bucket.expense();
            let net = inflow - outflow;
            cumulative += net;
            CashFlowPeriod {
                period: bucket.key,
                inflow,
                outflow,
                net,
                cumulative,
            }
        })
        .collect();

    CashFlowReport {
        summary: CashFlowSummary {
            opening_balance,
            total_inflow,
            total_outflow,
            net_cash_flow,
            closing_balance: opening_balance + net_cash_flow,
        },
        periods,
        by_payment_method: payment_method_flows(transactions),
        period: filters.into(),
    }
}

pub(crate) fn build_income_sources(
    transactions: &[NormalizedTransaction],
    filters: &ReportFilters,
) -> IncomeSourceReport {
    let total_income: f64 = transactions.iter().map(|tx| tx.amount).sum();

    let sources = group_by_field(transactions, TransactionField::Source)
        .into_iter()
        .map(|bucket| SourceBreakdown {
            source: bucket.key,
            amount: bucket.total,
            count: bucket.count,
            percentage: 0.0,
        })
        .collect();
    let mut by_source = calculate_percentages(sources);
    sort_by_amount_desc(&mut by_source);

    IncomeSourceReport {
        summary: IncomeSourceSummary {
            total_income,
            transaction_count: transactions.len(),
            source_count: by_source.len(),
            average_transaction: average(total_income, transactions.len()),
        },
        by_source,
        by_category: category_breakdowns(transactions, TransactionField::Category),
        by_period: period_amounts(group_by_period(transactions, filters.group_by())),
        period: filters.into(),
    }
}

pub(crate) fn build_expense_categories(
    transactions: &[NormalizedTransaction],
    filters: &ReportFilters,
) -> ExpenseCategoryReport {
    let total_expense: f64 = transactions.iter().map(|tx| tx.amount).sum();
    let by_category = category_breakdowns(transactions, TransactionField::ExpenseCategory);

    let methods = group_by_field(transactions, TransactionField::PaymentMethod)
        .into_iter()
        .map(|bucket| PaymentMethodShare {
            payment_method: bucket.key,
            amount: bucket.total,
            count: bucket.count,
            percentage: 0.0,
        })
        .collect();
    let mut by_payment_method = calculate_percentages(methods);
    sort_by_amount_desc(&mut by_payment_method);

    ExpenseCategoryReport {
        summary: ExpenseCategorySummary {
            total_expense,
            transaction_count: transactions.len(),
            category_count: by_category.len(),
            average_transaction: average(total_expense, transactions.len()),
        },
        by_category,
        by_payment_method,
        by_period: period_amounts(group_by_period(transactions, filters.group_by())),
        period: filters.into(),
    }
}

pub(crate) fn build_transaction_summary(
    transactions: &[NormalizedTransaction],
    filters: &ReportFilters,
) -> TransactionSummaryReport {
    let income_count = transactions.iter().filter(|tx| tx.is_income()).count();
    let expense_count = transactions.len() - income_count;
    let total_income = sum_where(transactions, TransactionType::Income);
    let total_expense = sum_where(transactions, TransactionType::Expense);

    let by_status = group_by_field(transactions, TransactionField::Status)
        .into_iter()
        .map(|bucket| StatusBreakdown {
            status: bucket.key,
            count: bucket.count,
            amount: bucket.total,
        })
        .collect();

    let by_project = group_by_field(transactions, TransactionField::Project)
        .into_iter()
        .map(|bucket| {
            let income = bucket.income();
            let expense = bucket.expense();
            ProjectBreakdown {
                project: bucket.key,
                income,
                expense,
                net: income - expense,
                count: bucket.count,
            }
        })
        .collect();

    TransactionSummaryReport {
        summary: TransactionSummaryTotals {
            total_transactions: transactions.len(),
            income_count,
            expense_count,
            total_income,
            total_expense,
            net_amount: total_income - total_expense,
            average_income: average(total_income, income_count),
            average_expense: average(total_expense, expense_count),
        },
        by_status,
        by_payment_method: payment_method_flows(transactions),
        by_project,
        period: filters.into(),
    }
}
