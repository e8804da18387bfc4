use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::claims::{AmountOutcome, ClaimFields, ClaimForm, Submission, SubmissionContext};
use crate::models::{ClaimType, ExpenseRequest, ExpenseRequestSummary};

/// Body of `POST /expense-requests`.
///
/// Required-field and format checks that belong to the submission gates
/// (recipient, transport number, amounts) are not repeated here.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExpenseRequestDto {
    pub claim_type: Option<ClaimType>,

    #[serde(default)]
    #[validate(length(max = 40, message = "Transport number is too long"))]
    pub transport_number: String,

    pub vehicle_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(max = 40, message = "Recipient code is too long"))]
    pub recipient_code: String,

    pub approver_id: Uuid,

    /// Defaults to today in Lima.
    pub invoice_date: Option<NaiveDate>,

    #[validate(length(max = 120, message = "Zone name is too long"))]
    pub zone: Option<String>,

    #[validate(length(max = 120, message = "Channel name is too long"))]
    pub channel: Option<String>,

    pub attributable_area_id: Uuid,

    pub declared_volume_m3: Option<Decimal>,
    pub contracted_rate_m3: Option<Decimal>,

    #[validate(length(max = 200, message = "Route is too long"))]
    pub false_freight_route: Option<String>,

    #[validate(length(max = 200, message = "Motive is too long"))]
    pub low_load_motive: Option<String>,

    #[validate(length(max = 2000, message = "Justification is too long"))]
    pub justification: Option<String>,

    /// Only read for claim types whose amount is entered by hand.
    pub amount: Option<Decimal>,
}

impl CreateExpenseRequestDto {
    pub fn into_submission(self, requester_id: Uuid, today: NaiveDate) -> Submission {
        Submission {
            context: SubmissionContext {
                requester_id,
                recipient_code: self.recipient_code,
                approver_id: self.approver_id,
                invoice_date: self.invoice_date.unwrap_or(today),
                channel: self.channel,
                attributable_area_id: self.attributable_area_id,
            },
            fields: ClaimFields {
                claim_type: self.claim_type,
                transport_number: self.transport_number,
                vehicle_id: self.vehicle_id,
                zone: self.zone,
                declared_volume_m3: self.declared_volume_m3,
                contracted_rate_m3: self.contracted_rate_m3,
                false_freight_route: self.false_freight_route,
                low_load_motive: self.low_load_motive,
                justification: self.justification,
                amount: self.amount,
            },
        }
    }
}

/// Body of `POST /expense-requests/quote`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteRequest {
    pub claim_type: ClaimType,
    pub vehicle_id: Option<Uuid>,
    #[validate(length(max = 120, message = "Zone name is too long"))]
    pub zone: Option<String>,
    pub declared_volume_m3: Option<Decimal>,
    pub contracted_rate_m3: Option<Decimal>,
    pub amount: Option<Decimal>,
}

impl From<QuoteRequest> for ClaimFields {
    fn from(req: QuoteRequest) -> Self {
        ClaimFields {
            claim_type: Some(req.claim_type),
            vehicle_id: req.vehicle_id,
            zone: req.zone,
            declared_volume_m3: req.declared_volume_m3,
            contracted_rate_m3: req.contracted_rate_m3,
            amount: req.amount,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub claim_type: ClaimType,
    pub claim_type_label: &'static str,
    /// `computed`, `not_applicable` or `pass_through`.
    pub result: &'static str,
    pub amount: Option<Decimal>,
    pub message: Option<&'static str>,
    pub formula: Option<String>,
}

impl QuoteResponse {
    pub fn from_form(claim_type: ClaimType, form: &ClaimForm) -> Self {
        let outcome = form.outcome();
        let result = match outcome {
            Some(AmountOutcome::Computed(_)) => "computed",
            Some(AmountOutcome::NotApplicable(_)) => "not_applicable",
            Some(AmountOutcome::PassThrough) | None => "pass_through",
        };

        Self {
            claim_type,
            claim_type_label: claim_type.label(),
            result,
            amount: form.amount(),
            message: outcome.and_then(|o| o.message()),
            formula: form.formula_hint(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseRequestResponse {
    #[serde(flatten)]
    pub request: ExpenseRequest,
    pub claim_type_label: Option<&'static str>,
}

impl From<ExpenseRequest> for ExpenseRequestResponse {
    fn from(request: ExpenseRequest) -> Self {
        let claim_type_label = ClaimType::from_string(&request.claim_type).map(|ct| ct.label());
        Self {
            request,
            claim_type_label,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseRequestListResponse {
    pub requests: Vec<ExpenseRequestSummary>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_invoice_date_defaults_to_today() {
        let dto: CreateExpenseRequestDto = serde_json::from_value(json!({
            "claim_type": "last_point",
            "transport_number": "60501234",
            "recipient_code": "10020030",
            "approver_id": Uuid::new_v4(),
            "attributable_area_id": Uuid::new_v4(),
            "justification": "2 estibas",
            "amount": "80.00"
        }))
        .unwrap();
        assert!(dto.validate().is_ok());

        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let submission = dto.into_submission(Uuid::new_v4(), today);
        assert_eq!(submission.context.invoice_date, today);
        assert_eq!(submission.fields.claim_type, Some(ClaimType::LastPoint));
    }

    #[test]
    fn test_overlong_justification_fails_validation() {
        let dto: CreateExpenseRequestDto = serde_json::from_value(json!({
            "approver_id": Uuid::new_v4(),
            "attributable_area_id": Uuid::new_v4(),
            "justification": "x".repeat(2001)
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
