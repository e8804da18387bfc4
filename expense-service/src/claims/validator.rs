//! Submission gates.
//!
//! A claim passes, in order: recipient resolution, transport-number format,
//! computed-amount applicability and the duplicate check. The first failing
//! gate decides the error. The approver and attributable area are checked
//! before the gates. Nothing is written here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use super::error::SubmissionError;
use super::form::ClaimDraft;
use crate::models::{ClaimType, CreateExpenseRequest, Recipient};
use crate::services::{DuplicateKey, ExpenseDirectory};

/// Request-level fields that are not part of the claim form proper.
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub requester_id: Uuid,
    pub recipient_code: String,
    pub approver_id: Uuid,
    pub invoice_date: NaiveDate,
    /// Falls back to the recipient's channel when absent.
    pub channel: Option<String>,
    pub attributable_area_id: Uuid,
}

/// Claim that passed every gate.
#[derive(Debug, Clone)]
pub struct ValidatedClaim {
    pub context: SubmissionContext,
    pub draft: ClaimDraft,
    pub recipient: Recipient,
    pub total_amount: Decimal,
}

impl ValidatedClaim {
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey {
            requester_id: self.context.requester_id,
            transport_number: self.draft.transport_number.clone(),
            claim_type: self.draft.claim_type,
            motive: self.draft.motive.clone(),
        }
    }

    pub fn into_request(self) -> CreateExpenseRequest {
        let channel = self
            .context
            .channel
            .filter(|c| !c.trim().is_empty())
            .or(self.recipient.channel)
            .unwrap_or_default();

        CreateExpenseRequest {
            requester_id: self.context.requester_id,
            vehicle_id: self.draft.vehicle_id,
            approver_id: self.context.approver_id,
            recipient_id: self.recipient.recipient_id,
            transport_number: self.draft.transport_number,
            invoice_date: self.context.invoice_date,
            zone: self.draft.zone,
            channel,
            claim_type: self.draft.claim_type.as_str().to_string(),
            motive: self.draft.motive,
            false_freight_route: self.draft.false_freight_route,
            declared_volume_m3: self.draft.declared_volume_m3,
            contracted_rate_m3: self.draft.contracted_rate_m3,
            total_amount: self.total_amount,
            justification: self.draft.justification,
            attributable_area_id: self.context.attributable_area_id,
        }
    }
}

/// Checks that `transport_number` is exactly `expected` ASCII digits.
pub fn check_transport_number(transport_number: &str, expected: usize) -> Result<(), SubmissionError> {
    if transport_number.len() == expected && transport_number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SubmissionError::InvalidTransportNumberLength { expected })
    }
}

pub struct SubmissionValidator<'a, D: ?Sized> {
    directory: &'a D,
    transport_number_length: usize,
}

impl<'a, D> SubmissionValidator<'a, D>
where
    D: ExpenseDirectory + ?Sized,
{
    pub fn new(directory: &'a D, transport_number_length: usize) -> Self {
        Self {
            directory,
            transport_number_length,
        }
    }

    #[instrument(
        skip_all,
        fields(
            requester_id = %context.requester_id,
            claim_type = draft.claim_type.as_str(),
            transport_number = %draft.transport_number
        )
    )]
    pub async fn validate(
        &self,
        context: SubmissionContext,
        draft: ClaimDraft,
    ) -> Result<ValidatedClaim, SubmissionError> {
        self.check_context(&context).await?;

        let recipient = self.resolve_recipient(&context.recipient_code).await?;

        check_transport_number(&draft.transport_number, self.transport_number_length)?;

        if draft.claim_type == ClaimType::UnderMinimumLoad && draft.outcome.is_not_applicable() {
            return Err(SubmissionError::NoChargeApplicable);
        }
        let total_amount = draft
            .amount
            .ok_or(SubmissionError::IncompleteClaim("amount"))?;

        let validated = ValidatedClaim {
            context,
            draft,
            recipient,
            total_amount,
        };

        let key = validated.duplicate_key();
        if self.directory.find_duplicate(&key).await? {
            tracing::info!(motive = %key.motive, "Duplicate expense request rejected");
            return Err(key.into_error());
        }

        Ok(validated)
    }

    async fn check_context(&self, context: &SubmissionContext) -> Result<(), SubmissionError> {
        if !self.directory.is_approver(context.approver_id).await? {
            return Err(SubmissionError::IncompleteClaim("approver_id"));
        }
        if !self.directory.area_exists(context.attributable_area_id).await? {
            return Err(SubmissionError::IncompleteClaim("attributable_area_id"));
        }
        Ok(())
    }

    async fn resolve_recipient(&self, code: &str) -> Result<Recipient, SubmissionError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SubmissionError::InvalidRecipientCode);
        }

        self.directory
            .resolve_recipient_by_code(code)
            .await?
            .ok_or(SubmissionError::InvalidRecipientCode)
    }
}
