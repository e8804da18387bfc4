//! Services module for expense-service.

pub mod database;
pub mod directory;
pub mod metrics;

pub use database::Database;
pub use directory::{DuplicateKey, ExpenseDirectory};
pub use metrics::{get_metrics, init_metrics};
