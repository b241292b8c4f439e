//! Report kinds and their typed outputs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::grouping::Proportion;
use crate::cache::{generate_cache_key, ttl};
use crate::models::ReportFilters;

/// The five report kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    ProfitLoss,
    CashFlow,
    IncomeSource,
    ExpenseCategory,
    TransactionSummary,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfitLoss => "profit-loss",
            Self::CashFlow => "cash-flow",
            Self::IncomeSource => "income-source",
            Self::ExpenseCategory => "expense-category",
            Self::TransactionSummary => "transaction-summary",
        }
    }

    pub fn all() -> &'static [ReportKind] {
        &[
            Self::ProfitLoss,
            Self::CashFlow,
            Self::IncomeSource,
            Self::ExpenseCategory,
            Self::TransactionSummary,
        ]
    }

    /// Prefix for this kind's cache keys
    pub fn cache_prefix(&self) -> String {
        format!("report:{}", self.as_str())
    }

    /// Cache key for this kind over `filters`
    pub fn cache_key(&self, filters: &ReportFilters) -> String {
        generate_cache_key(&self.cache_prefix(), &filters.cache_params())
    }

    /// Cache lifetime in seconds for a report over `filters`
    ///
    /// A range that ended before the current month is historical and can be
    /// kept for longer.
    pub fn ttl(&self, filters: &ReportFilters, today: NaiveDate) -> u64 {
        let month_start = today.with_day(1).unwrap_or(today);
        if filters.end_date.is_some_and(|end| end < month_start) {
            return ttl::LONG;
        }

        match self {
            Self::TransactionSummary => ttl::SHORT,
            _ => ttl::MEDIUM,
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "profit-loss" | "pnl" => Ok(Self::ProfitLoss),
            "cash-flow" => Ok(Self::CashFlow),
            "income-source" => Ok(Self::IncomeSource),
            "expense-category" => Ok(Self::ExpenseCategory),
            "transaction-summary" | "summary" => Ok(Self::TransactionSummary),
            _ => Err(format!(
                "Unknown report type: {} (valid: profit-loss, cash-flow, income-source, expense-category, transaction-summary)",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Date range a report covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<&ReportFilters> for ReportPeriod {
    fn from(filters: &ReportFilters) -> Self {
        Self {
            start_date: filters.start_date,
            end_date: filters.end_date,
        }
    }
}

/// Amount, count and share for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: String,
    pub amount: f64,
    pub count: usize,
    pub percentage: f64,
}

impl Proportion for CategoryBreakdown {
    fn amount(&self) -> f64 {
        self.amount
    }

    fn set_percentage(&mut self, percentage: f64) {
        self.percentage = percentage;
    }
}

// ========== Profit & Loss ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLossSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_profit: f64,
    /// Net profit as a percentage of income (0 without income)
    pub profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBreakdown {
    pub period: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySplit {
    pub income: Vec<CategoryBreakdown>,
    pub expense: Vec<CategoryBreakdown>,
}

/// Income against expense over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLossReport {
    pub summary: ProfitLossSummary,
    pub breakdown: Vec<PeriodBreakdown>,
    pub by_category: CategorySplit,
    pub period: ReportPeriod,
}

// ========== Cash Flow ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowSummary {
    /// Always 0: balances carried in from before the range are not computed
    pub opening_balance: f64,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub net_cash_flow: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowPeriod {
    pub period: String,
    pub inflow: f64,
    pub outflow: f64,
    pub net: f64,
    /// Running net across periods, starting from the opening balance
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodFlow {
    pub payment_method: String,
    pub inflow: f64,
    pub outflow: f64,
    pub net: f64,
    pub count: usize,
}

/// Money in and out over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub summary: CashFlowSummary,
    pub periods: Vec<CashFlowPeriod>,
    pub by_payment_method: Vec<PaymentMethodFlow>,
    pub period: ReportPeriod,
}

// ========== Income Sources ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSourceSummary {
    pub total_income: f64,
    pub transaction_count: usize,
    pub source_count: usize,
    pub average_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakdown {
    pub source: String,
    pub amount: f64,
    pub count: usize,
    pub percentage: f64,
}

impl Proportion for SourceBreakdown {
    fn amount(&self) -> f64 {
        self.amount
    }

    fn set_percentage(&mut self, percentage: f64) {
        self.percentage = percentage;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAmount {
    pub period: String,
    pub amount: f64,
    pub count: usize,
}

/// Where income came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSourceReport {
    pub summary: IncomeSourceSummary,
    pub by_source: Vec<SourceBreakdown>,
    pub by_category: Vec<CategoryBreakdown>,
    pub by_period: Vec<PeriodAmount>,
    pub period: ReportPeriod,
}

// ========== Expense Categories ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategorySummary {
    pub total_expense: f64,
    pub transaction_count: usize,
    pub category_count: usize,
    pub average_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodShare {
    pub payment_method: String,
    pub amount: f64,
    pub count: usize,
    pub percentage: f64,
}

impl Proportion for PaymentMethodShare {
    fn amount(&self) -> f64 {
        self.amount
    }

    fn set_percentage(&mut self, percentage: f64) {
        self.percentage = percentage;
    }
}

/// Where money went
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategoryReport {
    pub summary: ExpenseCategorySummary,
    pub by_category: Vec<CategoryBreakdown>,
    pub by_payment_method: Vec<PaymentMethodShare>,
    pub by_period: Vec<PeriodAmount>,
    pub period: ReportPeriod,
}

// ========== Transaction Summary ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummaryTotals {
    pub total_transactions: usize,
    pub income_count: usize,
    pub expense_count: usize,
    pub total_income: f64,
    pub total_expense: f64,
    pub net_amount: f64,
    pub average_income: f64,
    pub average_expense: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub status: String,
    pub count: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBreakdown {
    pub project: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub count: usize,
}

/// Counts and totals across all transactions in range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummaryReport {
    pub summary: TransactionSummaryTotals,
    pub by_status: Vec<StatusBreakdown>,
    pub by_payment_method: Vec<PaymentMethodFlow>,
    pub by_project: Vec<ProjectBreakdown>,
    pub period: ReportPeriod,
}

/// Any generated report
///
/// Tagged with `reportType` so a cached value always comes back as the same
/// variant it was stored as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reportType", rename_all = "kebab-case")]
pub enum Report {
    ProfitLoss(ProfitLossReport),
    CashFlow(CashFlowReport),
    IncomeSource(IncomeSourceReport),
    ExpenseCategory(ExpenseCategoryReport),
    TransactionSummary(TransactionSummaryReport),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::ProfitLoss(_) => ReportKind::ProfitLoss,
            Self::CashFlow(_) => ReportKind::CashFlow,
            Self::IncomeSource(_) => ReportKind::IncomeSource,
            Self::ExpenseCategory(_) => ReportKind::ExpenseCategory,
            Self::TransactionSummary(_) => ReportKind::TransactionSummary,
        }
    }

    /// Number of transactions the report was computed from
    pub fn record_count(&self) -> usize {
        match self {
            Self::ProfitLoss(r) => r
                .by_category
                .income
                .iter()
                .chain(r.by_category.expense.iter())
                .map(|c| c.count)
                .sum(),
            Self::CashFlow(r) => r.by_payment_method.iter().map(|m| m.count).sum(),
            Self::IncomeSource(r) => r.summary.transaction_count,
            Self::ExpenseCategory(r) => r.summary.transaction_count,
            Self::TransactionSummary(r) => r.summary.total_transactions,
        }
    }
}
