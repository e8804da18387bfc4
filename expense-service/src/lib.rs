//! Expense Service - logistics expense claims: amount computation, submission
//! checks and persistence.

pub mod claims;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

pub use startup::AppState;
