pub mod catalog;
pub mod expenses;

pub use catalog::{list_approvers, list_vehicles, lookup_recipient, master_data};
pub use expenses::{create_expense_request, list_my_expense_requests, quote_expense_request};
