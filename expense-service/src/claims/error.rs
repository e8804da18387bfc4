use service_core::error::AppError;
use thiserror::Error;

use crate::models::ClaimType;

/// Reasons a claim cannot be submitted.
///
/// Every variant is recoverable by correcting the input and submitting again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Missing or invalid field: {0}")]
    IncompleteClaim(&'static str),

    #[error("Invalid recipient code")]
    InvalidRecipientCode,

    #[error("Transport number must have exactly {expected} digits")]
    InvalidTransportNumberLength { expected: usize },

    #[error("The loaded volume meets the minimum. No charge applies.")]
    NoChargeApplicable,

    #[error(
        "A request already exists for transport {transport_number}, claim type '{}' and motive '{motive}'",
        .claim_type.label()
    )]
    DuplicateRequest {
        transport_number: String,
        claim_type: ClaimType,
        motive: String,
    },

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("Failed to save request: {0}")]
    PersistenceFailure(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),
}

impl SubmissionError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::IncompleteClaim(_) => "incomplete_claim",
            SubmissionError::InvalidRecipientCode => "invalid_recipient_code",
            SubmissionError::InvalidTransportNumberLength { .. } => {
                "invalid_transport_number_length"
            }
            SubmissionError::NoChargeApplicable => "no_charge_applicable",
            SubmissionError::DuplicateRequest { .. } => "duplicate_request",
            SubmissionError::SubmissionInProgress => "submission_in_progress",
            SubmissionError::PersistenceFailure(_) => "persistence_failure",
            SubmissionError::Lookup(_) => "lookup_failure",
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::IncompleteClaim(_)
            | SubmissionError::InvalidRecipientCode
            | SubmissionError::InvalidTransportNumberLength { .. }
            | SubmissionError::NoChargeApplicable => AppError::BadRequest(anyhow::anyhow!(err)),
            SubmissionError::DuplicateRequest { .. } | SubmissionError::SubmissionInProgress => {
                AppError::Conflict(anyhow::anyhow!(err))
            }
            SubmissionError::PersistenceFailure(e) => {
                AppError::DatabaseError(anyhow::anyhow!("Failed to save request: {}", e))
            }
            SubmissionError::Lookup(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
        }
    }
}
