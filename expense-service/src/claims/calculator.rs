//! Amount calculator for expense claims.
//!
//! False-freight and under-minimum-load amounts are derived here from volume,
//! rate, vehicle capacity and the zone's minimum load. The calculator keeps no
//! state: the same inputs always give the same outcome.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{ClaimType, Zone};

/// Minimum load applied when a zone is unknown or has no percentage configured.
pub const DEFAULT_MINIMUM_LOAD_PERCENTAGE: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Decimal places kept for volumes and capacities, as stored.
pub const VOLUME_SCALE: u32 = 2;

/// Decimal places kept for per-m3 rates, as stored.
pub const RATE_SCALE: u32 = 4;

/// Inputs the calculator reads. Absent values are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmountInputs<'a> {
    pub declared_volume_m3: Option<Decimal>,
    pub contracted_rate_m3: Option<Decimal>,
    pub capacity_m3: Option<Decimal>,
    pub zone_name: Option<&'a str>,
}

/// Why no amount could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotApplicable {
    /// A required input is absent, zero or negative.
    MissingInputs,
    /// The declared load already reaches the contractual minimum.
    MinimumLoadMet { required_minimum_volume_m3: Decimal },
    /// The product does not fit in a decimal amount.
    OutOfRange,
}

impl NotApplicable {
    /// Message shown to the submitter.
    pub fn message(&self) -> &'static str {
        match self {
            NotApplicable::MissingInputs => {
                "Volume, rate and vehicle capacity must be greater than zero to compute the amount."
            }
            NotApplicable::MinimumLoadMet { .. } => {
                "The loaded volume meets the minimum. No additional charge applies."
            }
            NotApplicable::OutOfRange => "The computed amount is out of range.",
        }
    }
}

/// Result of running the calculator for one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountOutcome {
    /// The amount is entered by the submitter; nothing to compute.
    PassThrough,
    /// Amount payable, rounded to two decimals.
    Computed(Decimal),
    /// No amount is payable. Distinct from a zero charge.
    NotApplicable(NotApplicable),
}

impl AmountOutcome {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            AmountOutcome::Computed(amount) => Some(*amount),
            _ => None,
        }
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, AmountOutcome::NotApplicable(_))
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            AmountOutcome::NotApplicable(reason) => Some(reason.message()),
            _ => None,
        }
    }
}

/// Rounds an amount to cents, half away from zero, always keeping two
/// decimal places.
pub fn round_amount(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Rounds an input to the scale it is stored with, half away from zero.
pub fn round_input(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Looks up the minimum load percentage configured for `zone_name`.
///
/// Falls back to [`DEFAULT_MINIMUM_LOAD_PERCENTAGE`] when the zone is not
/// configured or its percentage is unset or outside (0, 100].
pub fn minimum_load_percentage(zone_name: Option<&str>, zones: &[Zone]) -> Decimal {
    let Some(name) = zone_name.map(str::trim) else {
        return DEFAULT_MINIMUM_LOAD_PERCENTAGE;
    };

    zones
        .iter()
        .find(|zone| zone.name.trim() == name)
        .and_then(|zone| zone.minimum_load_percentage)
        .filter(|pct| *pct > Decimal::ZERO && *pct <= Decimal::ONE_HUNDRED)
        .unwrap_or(DEFAULT_MINIMUM_LOAD_PERCENTAGE)
}

/// Computes the amount payable for a claim.
pub fn calculate(claim_type: ClaimType, inputs: &AmountInputs<'_>, zones: &[Zone]) -> AmountOutcome {
    match claim_type {
        ClaimType::FalseFreight => false_freight(inputs),
        ClaimType::UnderMinimumLoad => under_minimum_load(inputs, zones),
        ClaimType::AdditionalExpense | ClaimType::RigidZone | ClaimType::LastPoint => {
            AmountOutcome::PassThrough
        }
    }
}

/// Contract formula shown next to a computed amount.
pub fn formula_hint(claim_type: ClaimType, zone_name: Option<&str>, zones: &[Zone]) -> Option<String> {
    match claim_type {
        ClaimType::FalseFreight => Some("declared volume (m3) x contracted rate".to_string()),
        ClaimType::UnderMinimumLoad => {
            let pct = minimum_load_percentage(zone_name, zones).normalize();
            Some(format!(
                "(capacity (m3) x {pct}% - declared volume (m3)) x contracted rate"
            ))
        }
        _ => None,
    }
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

fn is_negative(value: Option<Decimal>) -> bool {
    value.is_some_and(|v| v < Decimal::ZERO)
}

fn false_freight(inputs: &AmountInputs<'_>) -> AmountOutcome {
    let (Some(volume), Some(rate)) = (
        positive(inputs.declared_volume_m3),
        positive(inputs.contracted_rate_m3),
    ) else {
        return AmountOutcome::NotApplicable(NotApplicable::MissingInputs);
    };

    match volume.checked_mul(rate) {
        Some(total) => AmountOutcome::Computed(round_amount(total)),
        None => AmountOutcome::NotApplicable(NotApplicable::OutOfRange),
    }
}

fn under_minimum_load(inputs: &AmountInputs<'_>, zones: &[Zone]) -> AmountOutcome {
    if is_negative(inputs.declared_volume_m3) {
        return AmountOutcome::NotApplicable(NotApplicable::MissingInputs);
    }

    let (Some(capacity), Some(rate)) = (
        positive(inputs.capacity_m3),
        positive(inputs.contracted_rate_m3),
    ) else {
        return AmountOutcome::NotApplicable(NotApplicable::MissingInputs);
    };

    // An empty volume field counts as nothing loaded.
    let declared = inputs.declared_volume_m3.unwrap_or(Decimal::ZERO);
    let percentage = minimum_load_percentage(inputs.zone_name, zones);

    let Some(required) = capacity
        .checked_mul(percentage)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
    else {
        return AmountOutcome::NotApplicable(NotApplicable::OutOfRange);
    };

    let payable = required - declared;
    if payable <= Decimal::ZERO {
        return AmountOutcome::NotApplicable(NotApplicable::MinimumLoadMet {
            required_minimum_volume_m3: required,
        });
    }

    match payable.checked_mul(rate) {
        Some(total) => AmountOutcome::Computed(round_amount(total)),
        None => AmountOutcome::NotApplicable(NotApplicable::OutOfRange),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Positive decimal with up to two fractional digits.
    fn positive_decimal() -> impl Strategy<Value = Decimal> {
        (1i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn zones_with(pct: Decimal) -> Vec<Zone> {
        vec![Zone {
            zone_id: Uuid::nil(),
            name: "Zona".to_string(),
            minimum_load_percentage: Some(pct),
            active: true,
        }]
    }

    proptest! {
        /// False freight is volume times rate, rounded to cents.
        #[test]
        fn false_freight_is_rounded_product(volume in positive_decimal(), rate in positive_decimal()) {
            let inputs = AmountInputs {
                declared_volume_m3: Some(volume),
                contracted_rate_m3: Some(rate),
                ..Default::default()
            };
            prop_assert_eq!(
                calculate(ClaimType::FalseFreight, &inputs, &[]),
                AmountOutcome::Computed(round_amount(volume * rate))
            );
        }

        /// A zero volume or rate never yields an amount.
        #[test]
        fn false_freight_zero_input_not_applicable(value in positive_decimal(), zero_volume in any::<bool>()) {
            let (volume, rate) = if zero_volume {
                (Decimal::ZERO, value)
            } else {
                (value, Decimal::ZERO)
            };
            let inputs = AmountInputs {
                declared_volume_m3: Some(volume),
                contracted_rate_m3: Some(rate),
                ..Default::default()
            };
            prop_assert!(calculate(ClaimType::FalseFreight, &inputs, &[]).is_not_applicable());
        }

        /// Under-minimum-load amounts are never negative and only appear below the minimum.
        #[test]
        fn under_minimum_load_only_charges_below_minimum(
            capacity in positive_decimal(),
            declared in positive_decimal(),
            rate in positive_decimal(),
            pct in 1u32..=100,
        ) {
            let pct = Decimal::from(pct);
            let zones = zones_with(pct);
            let inputs = AmountInputs {
                declared_volume_m3: Some(declared),
                contracted_rate_m3: Some(rate),
                capacity_m3: Some(capacity),
                zone_name: Some("Zona"),
            };
            let required = capacity * pct / Decimal::ONE_HUNDRED;
            match calculate(ClaimType::UnderMinimumLoad, &inputs, &zones) {
                AmountOutcome::Computed(amount) => {
                    prop_assert!(declared < required);
                    prop_assert!(amount >= Decimal::ZERO);
                    prop_assert_eq!(amount, round_amount((required - declared) * rate));
                }
                AmountOutcome::NotApplicable(NotApplicable::MinimumLoadMet { required_minimum_volume_m3 }) => {
                    prop_assert!(declared >= required);
                    prop_assert_eq!(required_minimum_volume_m3, required);
                }
                other => prop_assert!(false, "unexpected outcome {:?}", other),
            }
        }

        /// Calling the calculator twice with the same inputs yields the same outcome.
        #[test]
        fn calculation_is_pure(
            volume in proptest::option::of(positive_decimal()),
            rate in proptest::option::of(positive_decimal()),
            capacity in proptest::option::of(positive_decimal()),
            idx in 0usize..5,
        ) {
            let claim_type = ClaimType::ALL[idx];
            let zones = zones_with(Decimal::from(85));
            let inputs = AmountInputs {
                declared_volume_m3: volume,
                contracted_rate_m3: rate,
                capacity_m3: capacity,
                zone_name: Some("Zona"),
            };
            prop_assert_eq!(
                calculate(claim_type, &inputs, &zones),
                calculate(claim_type, &inputs, &zones)
            );
        }
    }
}
