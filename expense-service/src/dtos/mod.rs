//! Request and response bodies for the HTTP API.

mod catalog;
mod expense;

pub use catalog::{ApproverListResponse, VehicleListResponse};
pub use expense::{
    CreateExpenseRequestDto, ExpenseRequestListResponse, ExpenseRequestResponse, QuoteRequest,
    QuoteResponse,
};
