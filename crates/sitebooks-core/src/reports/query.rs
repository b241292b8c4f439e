//! Query builder for report filters
//!
//! Turns a [`ReportFilters`] value into SQL conditions plus positional
//! parameters. Building is pure: the same filters always yield the same
//! query, which keeps it easy to test apart from the database.

use rusqlite::types::{ToSql, ToSqlOutput};

use crate::models::ReportFilters;

/// A single bound parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
}

impl ToSql for QueryValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            QueryValue::Text(s) => s.to_sql(),
            QueryValue::Integer(i) => i.to_sql(),
        }
    }
}

/// Conditions and parameters for a transaction query
///
/// Conditions refer to the transactions table as `t`. Each `?` placeholder
/// matches the parameter at the same position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub conditions: Vec<String>,
    pub params: Vec<QueryValue>,
}

impl TransactionQuery {
    /// WHERE clause including the keyword (empty when unconstrained)
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Parameters as trait objects for rusqlite
    pub fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p as &dyn ToSql).collect()
    }

    fn push(&mut self, condition: &str, value: QueryValue) {
        self.conditions.push(condition.to_string());
        self.params.push(value);
    }
}

/// Build the query for a set of report filters
///
/// Date bounds are inclusive; a single bound gives a one-sided range. Absent
/// filters (and an empty status list) add no condition at all.
pub fn build_query(filters: &ReportFilters) -> TransactionQuery {
    let mut query = TransactionQuery::default();

    if let Some(start) = filters.start_date {
        query.push("t.date >= ?", QueryValue::Text(start.to_string()));
    }
    if let Some(end) = filters.end_date {
        query.push("t.date <= ?", QueryValue::Text(end.to_string()));
    }
    if let Some(tx_type) = filters.tx_type {
        query.push("t.type = ?", QueryValue::Text(tx_type.as_str().to_string()));
    }
    if let Some(project_id) = filters.project_id {
        query.push("t.project_id = ?", QueryValue::Integer(project_id));
    }
    if let Some(category_id) = filters.category_id {
        query.push("t.category_id = ?", QueryValue::Integer(category_id));
    }
    if let Some(method) = &filters.payment_method {
        query.push("t.payment_method = ?", QueryValue::Text(method.clone()));
    }
    if !filters.status.is_empty() {
        let placeholders = vec!["?"; filters.status.len()].join(", ");
        query
            .conditions
            .push(format!("t.status IN ({})", placeholders));
        query.params.extend(
            filters
                .status
                .iter()
                .map(|s| QueryValue::Text(s.clone())),
        );
    }

    query
}
