//! Filtered, normalized transaction reads for reporting

use chrono::NaiveDate;
use tracing::debug;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{NormalizedTransaction, ReportFilters, TransactionType};
use crate::reports::query::build_query;

impl Database {
    /// Fetch the transactions matching `filters`, flattened for reporting
    ///
    /// Project and category names come from the referenced rows when they
    /// resolve and fall back to the copies stored on the transaction. A
    /// dangling reference never fails the read.
    pub fn query_transactions(
        &self,
        filters: &ReportFilters,
    ) -> Result<Vec<NormalizedTransaction>> {
        let query = build_query(filters);
        let sql = format!(
            r#"
            SELECT
                t.id, t.type, t.amount, t.date,
                t.project_id, p.name, t.project_name,
                t.category_id, c.name, t.category_name,
                t.source, t.payment_method, t.status, t.description
            FROM transactions t
            LEFT JOIN projects p ON p.id = t.project_id
            LEFT JOIN categories c ON c.id = t.category_id
            {}
            ORDER BY t.date, t.id
            "#,
            query.where_clause()
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(query.param_refs().as_slice(), |row| {
                Ok(TransactionRow {
                    id: row.get(0)?,
                    tx_type: row.get(1)?,
                    amount: row.get(2)?,
                    date: row.get(3)?,
                    project_id: row.get(4)?,
                    resolved_project: row.get(5)?,
                    stored_project: row.get(6)?,
                    category_id: row.get(7)?,
                    resolved_category: row.get(8)?,
                    stored_category: row.get(9)?,
                    source: row.get(10)?,
                    payment_method: row.get(11)?,
                    status: row.get(12)?,
                    description: row.get(13)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(count = rows.len(), "Fetched transactions for report");

        rows.into_iter().map(TransactionRow::normalize).collect()
    }
}

/// Joined row before flattening
struct TransactionRow {
    id: i64,
    tx_type: String,
    amount: f64,
    date: String,
    project_id: Option<i64>,
    resolved_project: Option<String>,
    stored_project: Option<String>,
    category_id: Option<i64>,
    resolved_category: Option<String>,
    stored_category: Option<String>,
    source: Option<String>,
    payment_method: Option<String>,
    status: String,
    description: Option<String>,
}

impl TransactionRow {
    fn normalize(self) -> Result<NormalizedTransaction> {
        let tx_type: TransactionType = self.tx_type.parse().map_err(Error::InvalidData)?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| Error::InvalidData(format!("Bad date '{}': {}", self.date, e)))?;

        let project_name = self.resolved_project.or(self.stored_project);
        let category = self.resolved_category.or(self.stored_category);
        let (category_name, expense_category_name) = match tx_type {
            TransactionType::Income => (category, None),
            TransactionType::Expense => (None, category),
        };

        Ok(NormalizedTransaction {
            id: self.id,
            tx_type,
            amount: self.amount,
            date,
            project_id: self.project_id,
            project_name,
            category_id: self.category_id,
            category_name,
            expense_category_name,
            source: self.source,
            payment_method: self.payment_method,
            status: self.status,
            description: self.description,
        })
    }
}
