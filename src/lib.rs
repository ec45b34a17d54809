//! Invoice financial engine
//!
//! Totals, promotions, installment plans and the invoice lifecycle, served
//! over HTTP with optimistic-concurrency persistence.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use crate::core::{AppError, Currency, Result};
pub use modules::installments;
pub use modules::invoices;
pub use modules::promotions;
pub use modules::transactions;
pub use modules::AppState;
