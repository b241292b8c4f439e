//! Sitebooks Core Library
//!
//! Shared functionality for the Sitebooks financial reporting service:
//! - Transaction store access with connection pooling and migrations
//! - Query builder that turns report filters into SQL
//! - Grouping utilities (period buckets, field buckets, percentages)
//! - Report service (profit & loss, cash flow, income sources,
//!   expense categories, transaction summary)
//! - Cache layer with pluggable backends (REST key-value store, in-process, disabled)

pub mod cache;
pub mod db;
pub mod error;
pub mod models;
pub mod reports;

/// Test utilities including mock cache server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{generate_cache_key, CacheBackend, CacheClient, MemoryCache, NoopCache, RestCache};
pub use db::Database;
pub use error::{Error, Result};
pub use models::{GroupBy, NormalizedTransaction, ReportFilters, TransactionType};
pub use reports::{Report, ReportKind, ReportService};
