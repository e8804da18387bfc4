//! Claim form controller.
//!
//! Holds the fields of one claim being written and calls the calculator
//! explicitly after every change that can affect the amount. Nothing here
//! touches the network.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::calculator::{
    calculate, formula_hint, round_amount, round_input, AmountInputs, AmountOutcome, RATE_SCALE,
    VOLUME_SCALE,
};
use super::error::SubmissionError;
use crate::models::{ClaimType, Zone};

/// Raw field values of a claim, as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimFields {
    pub claim_type: Option<ClaimType>,
    #[serde(default)]
    pub transport_number: String,
    pub vehicle_id: Option<Uuid>,
    pub zone: Option<String>,
    pub declared_volume_m3: Option<Decimal>,
    pub contracted_rate_m3: Option<Decimal>,
    pub false_freight_route: Option<String>,
    pub low_load_motive: Option<String>,
    pub justification: Option<String>,
    pub amount: Option<Decimal>,
}

/// Complete claim ready for the submission gates.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimDraft {
    pub claim_type: ClaimType,
    pub transport_number: String,
    pub vehicle_id: Uuid,
    pub zone: String,
    pub motive: String,
    pub false_freight_route: Option<String>,
    pub declared_volume_m3: Option<Decimal>,
    pub contracted_rate_m3: Option<Decimal>,
    pub justification: String,
    pub outcome: AmountOutcome,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimForm {
    claim_type: Option<ClaimType>,
    transport_number: String,
    vehicle_id: Option<Uuid>,
    capacity_m3: Option<Decimal>,
    zone: Option<String>,
    zones: Vec<Zone>,
    declared_volume_m3: Option<Decimal>,
    contracted_rate_m3: Option<Decimal>,
    false_freight_route: Option<String>,
    low_load_motive: Option<String>,
    justification: Option<String>,
    entered_amount: Option<Decimal>,
    outcome: Option<AmountOutcome>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ClaimForm {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones,
            ..Default::default()
        }
    }

    /// Builds a form by replaying `fields` through the setters.
    ///
    /// The claim type is applied first so the type-specific values that
    /// follow are not wiped by the switch.
    pub fn from_fields(fields: ClaimFields, capacity_m3: Option<Decimal>, zones: Vec<Zone>) -> Self {
        let mut form = Self::new(zones);
        if let Some(claim_type) = fields.claim_type {
            form.set_claim_type(claim_type);
        }
        form.set_transport_number(&fields.transport_number);
        if let Some(vehicle_id) = fields.vehicle_id {
            form.set_vehicle(vehicle_id, capacity_m3);
        }
        form.set_zone(fields.zone);
        form.set_declared_volume(fields.declared_volume_m3);
        form.set_contracted_rate(fields.contracted_rate_m3);
        form.set_false_freight_route(fields.false_freight_route);
        form.set_low_load_motive(fields.low_load_motive);
        form.set_justification(fields.justification);
        form.set_entered_amount(fields.amount);
        form
    }

    /// Switches the claim type and clears every type-specific field.
    pub fn set_claim_type(&mut self, claim_type: ClaimType) {
        self.claim_type = Some(claim_type);
        self.clear_type_specific();
        self.recompute();
    }

    /// Keeps only the digits of what was typed.
    pub fn set_transport_number(&mut self, raw: &str) {
        self.transport_number = raw.chars().filter(char::is_ascii_digit).collect();
    }

    pub fn set_vehicle(&mut self, vehicle_id: Uuid, capacity_m3: Option<Decimal>) {
        self.vehicle_id = Some(vehicle_id);
        self.capacity_m3 = capacity_m3.map(|c| round_input(c, VOLUME_SCALE));
        self.recompute();
    }

    pub fn set_zone(&mut self, zone: Option<String>) {
        self.zone = non_blank(zone);
        self.recompute();
    }

    /// Replaces the configured zones, e.g. after an administrator edits them.
    pub fn set_zones(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
        self.recompute();
    }

    /// Volume and rate keep only the decimals the store keeps, so the saved
    /// row reproduces the saved amount.
    pub fn set_declared_volume(&mut self, volume: Option<Decimal>) {
        self.declared_volume_m3 = volume.map(|v| round_input(v, VOLUME_SCALE));
        self.recompute();
    }

    pub fn set_contracted_rate(&mut self, rate: Option<Decimal>) {
        self.contracted_rate_m3 = rate.map(|r| round_input(r, RATE_SCALE));
        self.recompute();
    }

    pub fn set_false_freight_route(&mut self, route: Option<String>) {
        self.false_freight_route = non_blank(route);
    }

    pub fn set_low_load_motive(&mut self, motive: Option<String>) {
        self.low_load_motive = non_blank(motive);
    }

    pub fn set_justification(&mut self, justification: Option<String>) {
        self.justification = non_blank(justification);
    }

    /// Sets a hand-entered amount. Read-only for computed claim types.
    pub fn set_entered_amount(&mut self, amount: Option<Decimal>) {
        if self.claim_type.is_some_and(|ct| ct.is_computed()) {
            return;
        }
        self.entered_amount = amount.map(round_amount);
    }

    pub fn claim_type(&self) -> Option<ClaimType> {
        self.claim_type
    }

    pub fn transport_number(&self) -> &str {
        &self.transport_number
    }

    pub fn outcome(&self) -> Option<AmountOutcome> {
        self.outcome
    }

    /// Amount payable: computed for derived claim types, entered otherwise.
    pub fn amount(&self) -> Option<Decimal> {
        match self.outcome? {
            AmountOutcome::PassThrough => self.entered_amount,
            AmountOutcome::Computed(amount) => Some(amount),
            AmountOutcome::NotApplicable(_) => None,
        }
    }

    pub fn formula_hint(&self) -> Option<String> {
        self.claim_type
            .and_then(|ct| formula_hint(ct, self.zone.as_deref(), &self.zones))
    }

    /// Reason code that takes part in duplicate detection.
    pub fn motive(&self) -> String {
        match self.claim_type {
            Some(ClaimType::UnderMinimumLoad) => self.low_load_motive.clone(),
            Some(ct) if ct.requires_justification() => self.justification.clone(),
            _ => None,
        }
        .unwrap_or_default()
    }

    /// True when any field that belongs to a specific claim type holds a value.
    pub fn has_type_specific_values(&self) -> bool {
        self.declared_volume_m3.is_some()
            || self.contracted_rate_m3.is_some()
            || self.false_freight_route.is_some()
            || self.low_load_motive.is_some()
            || self.justification.is_some()
            || self.entered_amount.is_some()
    }

    /// Checks the fields every claim type requires and freezes the form.
    pub fn draft(&self) -> Result<ClaimDraft, SubmissionError> {
        let claim_type = self
            .claim_type
            .ok_or(SubmissionError::IncompleteClaim("claim_type"))?;
        let vehicle_id = self
            .vehicle_id
            .ok_or(SubmissionError::IncompleteClaim("vehicle_id"))?;
        let zone = self
            .zone
            .clone()
            .ok_or(SubmissionError::IncompleteClaim("zone"))?;
        let outcome = self
            .outcome
            .ok_or(SubmissionError::IncompleteClaim("claim_type"))?;

        match claim_type {
            ClaimType::FalseFreight => {
                if self.false_freight_route.is_none() {
                    return Err(SubmissionError::IncompleteClaim("false_freight_route"));
                }
                if outcome.amount().is_none() {
                    return Err(SubmissionError::IncompleteClaim("amount"));
                }
            }
            ClaimType::UnderMinimumLoad => {
                // A missing amount is rejected later as NoChargeApplicable.
                if self.low_load_motive.is_none() {
                    return Err(SubmissionError::IncompleteClaim("low_load_motive"));
                }
            }
            ClaimType::AdditionalExpense | ClaimType::RigidZone | ClaimType::LastPoint => {
                if self.justification.is_none() {
                    return Err(SubmissionError::IncompleteClaim("justification"));
                }
                if !self.entered_amount.is_some_and(|a| a > Decimal::ZERO) {
                    return Err(SubmissionError::IncompleteClaim("amount"));
                }
            }
        }

        Ok(ClaimDraft {
            claim_type,
            transport_number: self.transport_number.clone(),
            vehicle_id,
            zone,
            motive: self.motive(),
            false_freight_route: self.false_freight_route.clone(),
            declared_volume_m3: self.declared_volume_m3,
            contracted_rate_m3: self.contracted_rate_m3,
            justification: self.justification.clone().unwrap_or_default(),
            outcome,
            amount: self.amount(),
        })
    }

    fn clear_type_specific(&mut self) {
        self.declared_volume_m3 = None;
        self.contracted_rate_m3 = None;
        self.false_freight_route = None;
        self.low_load_motive = None;
        self.justification = None;
        self.entered_amount = None;
        self.outcome = None;
    }

    fn recompute(&mut self) {
        self.outcome = self.claim_type.map(|claim_type| {
            let inputs = AmountInputs {
                declared_volume_m3: self.declared_volume_m3,
                contracted_rate_m3: self.contracted_rate_m3,
                capacity_m3: self.capacity_m3,
                zone_name: self.zone.as_deref(),
            };
            calculate(claim_type, &inputs, &self.zones)
        });
    }
}
