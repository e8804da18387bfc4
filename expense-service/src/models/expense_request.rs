//! Expense request model for expense-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted expense request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpenseRequest {
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub vehicle_id: Uuid,
    pub approver_id: Uuid,
    pub recipient_id: Uuid,
    pub transport_number: String,
    pub invoice_date: NaiveDate,
    pub zone: String,
    pub channel: String,
    pub claim_type: String,
    pub motive: String,
    pub false_freight_route: Option<String>,
    pub declared_volume_m3: Option<Decimal>,
    pub contracted_rate_m3: Option<Decimal>,
    pub total_amount: Decimal,
    pub justification: String,
    pub attributable_area_id: Uuid,
    pub status: String,
    pub is_historical: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: Option<DateTime<Utc>>,
}

/// Row returned when a requester lists their own requests.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpenseRequestSummary {
    pub request_id: Uuid,
    pub created_utc: DateTime<Utc>,
    pub transport_number: String,
    pub claim_type: String,
    pub total_amount: Decimal,
    pub status: String,
    pub invoice_date: NaiveDate,
    pub zone: String,
    pub approver_name: Option<String>,
}

/// Input for inserting an expense request.
#[derive(Debug, Clone)]
pub struct CreateExpenseRequest {
    pub requester_id: Uuid,
    pub vehicle_id: Uuid,
    pub approver_id: Uuid,
    pub recipient_id: Uuid,
    pub transport_number: String,
    pub invoice_date: NaiveDate,
    pub zone: String,
    pub channel: String,
    pub claim_type: String,
    pub motive: String,
    pub false_freight_route: Option<String>,
    pub declared_volume_m3: Option<Decimal>,
    pub contracted_rate_m3: Option<Decimal>,
    pub total_amount: Decimal,
    pub justification: String,
    pub attributable_area_id: Uuid,
}
