//! Financial reports
//!
//! - `query`: report filters to SQL
//! - `grouping`: period and field buckets, percentage distributions
//! - `types`: report kinds and typed report payloads
//! - `service`: the five report generators

pub mod grouping;
pub mod query;
mod service;
mod types;

pub use service::ReportService;
pub use types::*;
