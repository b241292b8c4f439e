//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init command and shared utilities (open_db)
//! - `data` - Project, category and transaction bookkeeping
//! - `reports` - Report generation and period resolution
//! - `serve` - Web server command
//! - `warm` - Cache pre-warm command

pub mod core;
pub mod data;
pub mod reports;
pub mod serve;
pub mod warm;

// Re-export command functions for main.rs
pub use core::*;
pub use data::*;
pub use reports::*;
pub use serve::*;
pub use warm::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount with two decimals and a thousands separator
pub fn money(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}
