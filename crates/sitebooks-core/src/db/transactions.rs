//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};

const TRANSACTION_COLUMNS: &str = "id, type, amount, date, project_id, project_name, category_id, category_name, source, payment_method, status, description, created_at";

impl Database {
    /// Insert a transaction, returning its ID
    ///
    /// The referenced project and category must exist; their current names are
    /// copied onto the row. An income transaction needs an income category and
    /// an expense transaction an expense category.
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Amount must be a non-negative number, got {}",
                tx.amount
            )));
        }

        let project_name = match tx.project_id {
            Some(id) => Some(
                self.get_project(id)?
                    .ok_or_else(|| Error::NotFound(format!("Project {}", id)))?
                    .name,
            ),
            None => None,
        };

        let category_name = match tx.category_id {
            Some(id) => {
                let category = self
                    .get_category(id)?
                    .ok_or_else(|| Error::NotFound(format!("Category {}", id)))?;
                if category.kind != tx.tx_type {
                    return Err(Error::InvalidData(format!(
                        "Category '{}' is a {} category, transaction is {}",
                        category.name, category.kind, tx.tx_type
                    )));
                }
                Some(category.name)
            }
            None => None,
        };

        let status = tx
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("pending");

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (type, amount, date, project_id, project_name, category_id, category_name, source, payment_method, status, description)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.tx_type.as_str(),
                tx.amount,
                tx.date.to_string(),
                tx.project_id,
                project_name,
                tx.category_id,
                category_name,
                tx.source,
                tx.payment_method,
                status,
                tx.description,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS);
        let raw = conn.query_row(&sql, params![id], RawTransaction::from_row).optional()?;
        raw.map(RawTransaction::into_transaction).transpose()
    }

    /// List transactions, newest first
    pub fn list_transactions(&self, limit: i64, offset: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit, offset], RawTransaction::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawTransaction::into_transaction).collect()
    }

    /// Set a transaction's workflow status
    pub fn update_transaction_status(&self, id: i64, status: &str) -> Result<()> {
        let status = status.trim();
        if status.is_empty() {
            return Err(Error::InvalidData("Status cannot be empty".into()));
        }

        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions SET status = ? WHERE id = ?",
            params![status, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    /// Count all transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }
}

/// Row as read from SQLite, before text columns are parsed
struct RawTransaction {
    id: i64,
    tx_type: String,
    amount: f64,
    date: String,
    project_id: Option<i64>,
    project_name: Option<String>,
    category_id: Option<i64>,
    category_name: Option<String>,
    source: Option<String>,
    payment_method: Option<String>,
    status: String,
    description: Option<String>,
    created_at: String,
}

impl RawTransaction {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            tx_type: row.get(1)?,
            amount: row.get(2)?,
            date: row.get(3)?,
            project_id: row.get(4)?,
            project_name: row.get(5)?,
            category_id: row.get(6)?,
            category_name: row.get(7)?,
            source: row.get(8)?,
            payment_method: row.get(9)?,
            status: row.get(10)?,
            description: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            id: self.id,
            tx_type: self.tx_type.parse().map_err(Error::InvalidData)?,
            amount: self.amount,
            date: NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
                .map_err(|e| Error::InvalidData(format!("Bad date '{}': {}", self.date, e)))?,
            project_id: self.project_id,
            project_name: self.project_name,
            category_id: self.category_id,
            category_name: self.category_name,
            source: self.source,
            payment_method: self.payment_method,
            status: self.status,
            description: self.description,
            created_at: parse_datetime(&self.created_at),
        })
    }
}
