//! Grouping utilities for normalized transactions
//!
//! Pure functions that bucket transactions by period or by field and turn
//! amount lists into percentage distributions.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{GroupBy, NormalizedTransaction};

/// Label used for transactions with no value in the grouped field
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Transactions sharing a grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBucket<T> {
    pub key: String,
    pub items: Vec<T>,
    pub count: usize,
    pub total: f64,
}

impl<T> GroupedBucket<T> {
    fn new(key: String) -> Self {
        Self {
            key,
            items: Vec::new(),
            count: 0,
            total: 0.0,
        }
    }
}

impl<'a> GroupedBucket<&'a NormalizedTransaction> {
    fn add(&mut self, tx: &'a NormalizedTransaction) {
        self.items.push(tx);
        self.count += 1;
        self.total += tx.amount;
    }

    /// Sum of income amounts in this bucket
    pub fn income(&self) -> f64 {
        self.items
            .iter()
            .filter(|tx| tx.is_income())
            .map(|tx| tx.amount)
            .sum()
    }

    /// Sum of expense amounts in this bucket
    pub fn expense(&self) -> f64 {
        self.items
            .iter()
            .filter(|tx| tx.is_expense())
            .map(|tx| tx.amount)
            .sum()
    }
}

/// Grouping key for a date
///
/// - day: `YYYY-MM-DD`
/// - week: `YYYY-MM-DD` of the Sunday that starts the week
/// - month: `YYYY-MM`
/// - quarter: `YYYY-Q1` .. `YYYY-Q4`
/// - year: `YYYY`
pub fn period_key(date: NaiveDate, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Day => date.format("%Y-%m-%d").to_string(),
        GroupBy::Week => {
            let days_since_sunday = date.weekday().num_days_from_sunday() as i64;
            let week_start = date - Duration::days(days_since_sunday);
            week_start.format("%Y-%m-%d").to_string()
        }
        GroupBy::Month => format!("{:04}-{:02}", date.year(), date.month()),
        GroupBy::Quarter => format!("{:04}-Q{}", date.year(), date.month0() / 3 + 1),
        GroupBy::Year => format!("{:04}", date.year()),
    }
}

/// Bucket transactions by period, ascending by key
///
/// Only periods with at least one transaction appear.
pub fn group_by_period<'a, I>(
    transactions: I,
    group_by: GroupBy,
) -> Vec<GroupedBucket<&'a NormalizedTransaction>>
where
    I: IntoIterator<Item = &'a NormalizedTransaction>,
{
    let mut buckets: BTreeMap<String, GroupedBucket<&'a NormalizedTransaction>> = BTreeMap::new();

    for tx in transactions {
        let key = period_key(tx.date, group_by);
        buckets
            .entry(key.clone())
            .or_insert_with(|| GroupedBucket::new(key))
            .add(tx);
    }

    buckets.into_values().collect()
}

/// A transaction field that can be used as a grouping dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionField {
    Category,
    ExpenseCategory,
    Source,
    PaymentMethod,
    Status,
    Project,
    Type,
}

impl TransactionField {
    /// The field's value on a transaction, if any
    pub fn value<'a>(&self, tx: &'a NormalizedTransaction) -> Option<&'a str> {
        match self {
            Self::Category => tx.category_name.as_deref(),
            Self::ExpenseCategory => tx.expense_category_name.as_deref(),
            Self::Source => tx.source.as_deref(),
            Self::PaymentMethod => tx.payment_method.as_deref(),
            Self::Status => Some(tx.status.as_str()),
            Self::Project => tx.project_name.as_deref(),
            Self::Type => Some(tx.tx_type.as_str()),
        }
    }
}

/// Bucket transactions by a field's value, in encounter order
///
/// Missing or blank values are grouped under [`UNKNOWN_LABEL`].
pub fn group_by_field<'a, I>(
    transactions: I,
    field: TransactionField,
) -> Vec<GroupedBucket<&'a NormalizedTransaction>>
where
    I: IntoIterator<Item = &'a NormalizedTransaction>,
{
    let mut buckets: Vec<GroupedBucket<&'a NormalizedTransaction>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tx in transactions {
        let key = field
            .value(tx)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_LABEL);

        let position = match index.get(key) {
            Some(&position) => position,
            None => {
                buckets.push(GroupedBucket::new(key.to_string()));
                index.insert(key.to_string(), buckets.len() - 1);
                buckets.len() - 1
            }
        };
        buckets[position].add(tx);
    }

    buckets
}

/// An item that carries an amount and a share of the total
pub trait Proportion {
    fn amount(&self) -> f64;
    fn set_percentage(&mut self, percentage: f64);
}

/// Attach `amount / grand_total * 100` to every item
///
/// When the grand total is zero every percentage is zero.
pub fn calculate_percentages<T: Proportion>(mut items: Vec<T>) -> Vec<T> {
    let grand_total: f64 = items.iter().map(Proportion::amount).sum();

    for item in &mut items {
        let percentage = if grand_total != 0.0 {
            item.amount() / grand_total * 100.0
        } else {
            0.0
        };
        item.set_percentage(percentage);
    }

    items
}

/// Sort descending by amount, keeping encounter order for ties
pub fn sort_by_amount_desc<T: Proportion>(items: &mut [T]) {
    items.sort_by(|a, b| b.amount().total_cmp(&a.amount()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(
        id: i64,
        tx_type: TransactionType,
        amount: f64,
        date: NaiveDate,
    ) -> NormalizedTransaction {
        NormalizedTransaction {
            id,
            tx_type,
            amount,
            date,
            project_id: None,
            project_name: None,
            category_id: None,
            category_name: None,
            expense_category_name: None,
            source: None,
            payment_method: None,
            status: "pending".into(),
            description: None,
        }
    }

    #[derive(Debug)]
    struct Share {
        amount: f64,
        percentage: f64,
    }

    impl Proportion for Share {
        fn amount(&self) -> f64 {
            self.amount
        }
        fn set_percentage(&mut self, percentage: f64) {
            self.percentage = percentage;
        }
    }

    fn shares(amounts: &[f64]) -> Vec<Share> {
        amounts
            .iter()
            .map(|&amount| Share {
                amount,
                percentage: -1.0,
            })
            .collect()
    }

    #[test]
    fn test_period_keys() {
        // 2024-01-10 is a Wednesday
        let d = date(2024, 1, 10);
        assert_eq!(period_key(d, GroupBy::Day), "2024-01-10");
        assert_eq!(period_key(d, GroupBy::Week), "2024-01-07");
        assert_eq!(period_key(d, GroupBy::Month), "2024-01");
        assert_eq!(period_key(d, GroupBy::Quarter), "2024-Q1");
        assert_eq!(period_key(d, GroupBy::Year), "2024");
    }

    #[test]
    fn test_week_key_sunday_is_own_start() {
        // 2024-03-03 is a Sunday
        assert_eq!(period_key(date(2024, 3, 3), GroupBy::Week), "2024-03-03");
        // Saturday belongs to the previous Sunday
        assert_eq!(period_key(date(2024, 3, 9), GroupBy::Week), "2024-03-03");
    }

    #[test]
    fn test_week_key_crosses_year_boundary() {
        // 2025-01-01 is a Wednesday; its week starts 2024-12-29
        assert_eq!(period_key(date(2025, 1, 1), GroupBy::Week), "2024-12-29");
    }

    #[test]
    fn test_quarter_boundaries() {
        assert_eq!(period_key(date(2024, 3, 31), GroupBy::Quarter), "2024-Q1");
        assert_eq!(period_key(date(2024, 4, 1), GroupBy::Quarter), "2024-Q2");
        assert_eq!(period_key(date(2024, 9, 30), GroupBy::Quarter), "2024-Q3");
        assert_eq!(period_key(date(2024, 12, 31), GroupBy::Quarter), "2024-Q4");
    }

    #[test]
    fn test_group_by_period_sorted_no_empty_buckets() {
        let txs = vec![
            tx(1, TransactionType::Income, 10.0, date(2024, 3, 5)),
            tx(2, TransactionType::Expense, 4.0, date(2024, 1, 20)),
            tx(3, TransactionType::Income, 6.0, date(2024, 3, 28)),
        ];
        let buckets = group_by_period(&txs, GroupBy::Month);

        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-03"]);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].total, 16.0);
        assert_eq!(buckets[0].expense(), 4.0);
        assert_eq!(buckets[0].income(), 0.0);
    }

    #[test]
    fn test_group_by_period_partitions_input() {
        let txs: Vec<_> = (0..40)
            .map(|i| {
                tx(
                    i,
                    TransactionType::Income,
                    1.0,
                    date(2024, 1, 1) + Duration::days(i * 9),
                )
            })
            .collect();

        for group_by in [
            GroupBy::Day,
            GroupBy::Week,
            GroupBy::Month,
            GroupBy::Quarter,
            GroupBy::Year,
        ] {
            let buckets = group_by_period(&txs, group_by);
            let mut ids: Vec<i64> = buckets
                .iter()
                .flat_map(|b| b.items.iter().map(|t| t.id))
                .collect();
            ids.sort();
            assert_eq!(ids, (0..40).collect::<Vec<_>>(), "{:?}", group_by);

            let counted: usize = buckets.iter().map(|b| b.count).sum();
            assert_eq!(counted, txs.len());
        }
    }

    #[test]
    fn test_group_by_field_unknown_and_encounter_order() {
        let mut a = tx(1, TransactionType::Expense, 100.0, date(2024, 1, 1));
        a.expense_category_name = Some("Materials".into());
        let mut b = tx(2, TransactionType::Expense, 50.0, date(2024, 1, 2));
        b.expense_category_name = None;
        let mut c = tx(3, TransactionType::Expense, 200.0, date(2024, 1, 3));
        c.expense_category_name = Some("Materials".into());
        let mut d = tx(4, TransactionType::Expense, 5.0, date(2024, 1, 4));
        d.expense_category_name = Some("  ".into());

        let txs = vec![a, b, c, d];
        let buckets = group_by_field(&txs, TransactionField::ExpenseCategory);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "Materials");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].total, 300.0);
        assert_eq!(buckets[1].key, UNKNOWN_LABEL);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].total, 55.0);
    }

    #[test]
    fn test_group_by_status_always_present() {
        let txs = vec![tx(1, TransactionType::Income, 1.0, date(2024, 1, 1))];
        let buckets = group_by_field(&txs, TransactionField::Status);
        assert_eq!(buckets[0].key, "pending");
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let items = calculate_percentages(shares(&[100.0, 200.0, 50.0]));
        let sum: f64 = items.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((items[1].percentage - 57.142857142857146).abs() < 1e-9);
    }

    #[test]
    fn test_percentages_zero_total() {
        let items = calculate_percentages(shares(&[0.0, 0.0]));
        assert!(items.iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn test_percentages_empty() {
        let items: Vec<Share> = calculate_percentages(Vec::new());
        assert!(items.is_empty());
    }

    #[test]
    fn test_sort_by_amount_desc_stable() {
        let mut items = shares(&[5.0, 10.0, 5.0, 1.0]);
        items[0].percentage = 1.0;
        items[2].percentage = 2.0;
        sort_by_amount_desc(&mut items);
        let amounts: Vec<f64> = items.iter().map(|s| s.amount).collect();
        assert_eq!(amounts, vec![10.0, 5.0, 5.0, 1.0]);
        assert_eq!(items[1].percentage, 1.0);
        assert_eq!(items[2].percentage, 2.0);
    }
}
