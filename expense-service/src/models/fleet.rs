//! Vehicle, zone and recipient models for expense-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle assigned to a carrier.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub vehicle_id: Uuid,
    pub carrier_id: Uuid,
    pub plate: String,
    pub capacity_m3: Decimal,
}

/// Delivery zone with its contractual minimum load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Zone {
    pub zone_id: Uuid,
    pub name: String,
    /// Percentage of vehicle capacity below which an under-minimum-load charge applies.
    pub minimum_load_percentage: Option<Decimal>,
    pub active: bool,
}

/// Delivery point resolved from a destination code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Recipient {
    pub recipient_id: Uuid,
    pub code: String,
    pub name: String,
    pub channel: Option<String>,
    pub sales_office: Option<String>,
}
