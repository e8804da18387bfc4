//! Master data and settings models for expense-service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Zone;

/// Option list category for false-freight routes.
pub const ROUTE_OPTION_CATEGORY: &str = "ruta_ff";

/// Option list category for low-load motives.
pub const LOW_LOAD_MOTIVE_CATEGORY: &str = "motivo_cm";

/// Simple named catalog entry (channel, attributable area, motive).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
}

/// Selectable option from a categorised option list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MasterOption {
    pub option_id: Uuid,
    pub category: String,
    pub value: String,
    pub label: String,
    pub sort_order: i32,
}

/// Everything a claim form needs to populate its pickers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasterData {
    pub zones: Vec<Zone>,
    pub channels: Vec<CatalogEntry>,
    pub areas: Vec<CatalogEntry>,
    pub motives: Vec<CatalogEntry>,
    pub routes: Vec<MasterOption>,
    pub low_load_motives: Vec<MasterOption>,
}

impl MasterData {
    /// Splits a flat option list into the route and low-load motive pickers.
    pub fn with_options(mut self, options: Vec<MasterOption>) -> Self {
        for option in options {
            match option.category.as_str() {
                ROUTE_OPTION_CATEGORY => self.routes.push(option),
                LOW_LOAD_MOTIVE_CATEGORY => self.low_load_motives.push(option),
                _ => {}
            }
        }
        self
    }
}

/// Profile allowed to approve expense requests.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Approver {
    pub profile_id: Uuid,
    pub full_name: String,
    pub role: String,
}

/// Site-wide settings maintained by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub transport_number_length: usize,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            transport_number_length: 8,
        }
    }
}
