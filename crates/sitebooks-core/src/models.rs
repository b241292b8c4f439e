//! Domain models for Sitebooks

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!(
                "Unknown transaction type: {} (valid: income, expense)",
                s
            )),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Period granularity for time-bucketed breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(format!(
                "Unknown groupBy: {} (valid: day, week, month, quarter, year)",
                s
            )),
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A construction project that transactions can be booked against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub client: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New project (before insertion)
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub client: Option<String>,
}

/// An income or expense category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: TransactionType,
    pub created_at: DateTime<Utc>,
}

/// A stored financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: f64,
    pub date: NaiveDate,
    pub project_id: Option<i64>,
    /// Copy of the project name taken when the transaction was written
    pub project_name: Option<String>,
    pub category_id: Option<i64>,
    /// Copy of the category name taken when the transaction was written
    pub category_name: Option<String>,
    /// Payer for income, vendor for expenses
    pub source: Option<String>,
    pub payment_method: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New transaction (before insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub tx_type: TransactionType,
    pub amount: f64,
    pub date: NaiveDate,
    pub project_id: Option<i64>,
    pub category_id: Option<i64>,
    pub source: Option<String>,
    pub payment_method: Option<String>,
    /// Defaults to "pending"
    pub status: Option<String>,
    pub description: Option<String>,
}

impl NewTransaction {
    /// Minimal transaction: everything optional left empty
    pub fn new(tx_type: TransactionType, amount: f64, date: NaiveDate) -> Self {
        Self {
            tx_type,
            amount,
            date,
            project_id: None,
            category_id: None,
            source: None,
            payment_method: None,
            status: None,
            description: None,
        }
    }
}

/// A transaction flattened for reporting
///
/// Referenced names are resolved to scalars. `category_name` is only set for
/// income and `expense_category_name` only for expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTransaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: f64,
    pub date: NaiveDate,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub expense_category_name: Option<String>,
    pub source: Option<String>,
    pub payment_method: Option<String>,
    pub status: String,
    pub description: Option<String>,
}

impl NormalizedTransaction {
    pub fn is_income(&self) -> bool {
        self.tx_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.tx_type == TransactionType::Expense
    }
}

/// Parameters that scope a report
///
/// Used both to build the database query and to derive the cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
}

impl ReportFilters {
    /// Filters for an inclusive date range, everything else unconstrained
    pub fn for_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        }
    }

    /// Effective grouping granularity (month when unset)
    pub fn group_by(&self) -> GroupBy {
        self.group_by.unwrap_or_default()
    }

    /// Copy with the transaction type forced
    pub fn with_type(mut self, tx_type: TransactionType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    /// Copy with the grouping granularity set
    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    /// Require both bounds and check they are ordered
    pub fn require_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start <= end => Ok((start, end)),
            (Some(_), Some(_)) => Err(Error::Validation(
                "startDate must be on or before endDate".to_string(),
            )),
            _ => Err(Error::Validation(
                "startDate and endDate are required".to_string(),
            )),
        }
    }

    /// Named parameter pairs used for cache key derivation
    ///
    /// Absent fields are omitted. `groupBy` is always present so an unset
    /// granularity and an explicit `month` produce the same pairs. Status
    /// values are sorted and de-duplicated. Free-text values are escaped so
    /// they can never spell out a different parameter set.
    pub fn cache_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(start) = self.start_date {
            params.push(("startDate", start.to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("endDate", end.to_string()));
        }
        if let Some(project_id) = self.project_id {
            params.push(("projectId", project_id.to_string()));
        }
        if let Some(tx_type) = self.tx_type {
            params.push(("type", tx_type.as_str().to_string()));
        }
        if let Some(category_id) = self.category_id {
            params.push(("categoryId", category_id.to_string()));
        }
        if let Some(method) = &self.payment_method {
            params.push(("paymentMethod", escape_key_value(method)));
        }
        if !self.status.is_empty() {
            let mut statuses: Vec<String> =
                self.status.iter().map(|s| escape_key_value(s)).collect();
            statuses.sort();
            statuses.dedup();
            params.push(("status", statuses.join(",")));
        }
        params.push(("groupBy", self.group_by().as_str().to_string()));

        params
    }
}

/// Percent-encode the characters that delimit cache key parts
fn escape_key_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '|' => escaped.push_str("%7C"),
            ':' => escaped.push_str("%3A"),
            ',' => escaped.push_str("%2C"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parse a filter date: `YYYY-MM-DD` or an RFC 3339 timestamp (date part)
pub fn parse_filter_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_filter_date(s).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("Invalid date: {} (use YYYY-MM-DD)", s))
        }),
    }
}
