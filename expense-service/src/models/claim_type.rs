//! Claim type model for expense-service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of expense being claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    AdditionalExpense,
    FalseFreight,
    UnderMinimumLoad,
    RigidZone,
    LastPoint,
}

impl ClaimType {
    pub const ALL: [ClaimType; 5] = [
        ClaimType::AdditionalExpense,
        ClaimType::FalseFreight,
        ClaimType::UnderMinimumLoad,
        ClaimType::RigidZone,
        ClaimType::LastPoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::AdditionalExpense => "additional_expense",
            ClaimType::FalseFreight => "false_freight",
            ClaimType::UnderMinimumLoad => "under_minimum_load",
            ClaimType::RigidZone => "rigid_zone",
            ClaimType::LastPoint => "last_point",
        }
    }

    /// Label shown to drivers and approvers.
    pub fn label(&self) -> &'static str {
        match self {
            ClaimType::AdditionalExpense => "Gasto Adicional",
            ClaimType::FalseFreight => "Falso Flete",
            ClaimType::UnderMinimumLoad => "Carga < al % mínimo",
            ClaimType::RigidZone => "Zona Rígida",
            ClaimType::LastPoint => "Último Punto",
        }
    }

    /// Parses either the storage key or the display label.
    pub fn from_string(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|claim_type| claim_type.as_str() == s || claim_type.label() == s)
    }

    /// Amount is derived from volume and rate and never entered by hand.
    pub fn is_computed(&self) -> bool {
        matches!(self, ClaimType::FalseFreight | ClaimType::UnderMinimumLoad)
    }

    /// Amount is entered by hand and must be backed by a written justification.
    pub fn requires_justification(&self) -> bool {
        !self.is_computed()
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string_accepts_key_and_label() {
        for claim_type in ClaimType::ALL {
            assert_eq!(ClaimType::from_string(claim_type.as_str()), Some(claim_type));
            assert_eq!(ClaimType::from_string(claim_type.label()), Some(claim_type));
        }
        assert_eq!(ClaimType::from_string("fuel"), None);
    }

    #[test]
    fn test_computed_types() {
        assert!(ClaimType::FalseFreight.is_computed());
        assert!(ClaimType::UnderMinimumLoad.is_computed());
        assert!(ClaimType::RigidZone.requires_justification());
        assert!(ClaimType::LastPoint.requires_justification());
        assert!(ClaimType::AdditionalExpense.requires_justification());
    }

    #[test]
    fn test_serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&ClaimType::UnderMinimumLoad).unwrap();
        assert_eq!(json, "\"under_minimum_load\"");
    }
}
