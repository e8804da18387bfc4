//! Domain models for expense-service.

mod claim_type;
mod expense_request;
mod fleet;
mod master_data;

pub use claim_type::ClaimType;
pub use expense_request::{
    CreateExpenseRequest, ExpenseRequest, ExpenseRequestSummary,
};
pub use fleet::{Recipient, Vehicle, Zone};
pub use master_data::{
    Approver, CatalogEntry, MasterData, MasterOption, SystemSettings, LOW_LOAD_MOTIVE_CATEGORY,
    ROUTE_OPTION_CATEGORY,
};
