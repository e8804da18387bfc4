//! Submission orchestrator.
//!
//! Loads the collaborators a claim needs, runs the form checks and the
//! submission gates, then persists. Only one submission per requester runs
//! at a time, and a submission whose token is cancelled before it finishes
//! is discarded.

use std::sync::Arc;

use dashmap::DashSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::SubmissionError;
use super::form::{ClaimFields, ClaimForm};
use super::validator::{SubmissionContext, SubmissionValidator};
use crate::models::ExpenseRequest;
use crate::services::metrics::{REQUEST_AMOUNT_TOTAL, SUBMISSIONS_TOTAL};
use crate::services::ExpenseDirectory;

/// One submit action: the form fields plus the request context.
#[derive(Debug, Clone)]
pub struct Submission {
    pub context: SubmissionContext,
    pub fields: ClaimFields,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Created(ExpenseRequest),
    /// The submitter went away before the result was applied.
    Discarded,
}

impl SubmitOutcome {
    fn label(&self) -> &'static str {
        match self {
            SubmitOutcome::Created(_) => "created",
            SubmitOutcome::Discarded => "discarded",
        }
    }
}

/// Removes the requester from the in-flight set when dropped.
struct InFlight<'a> {
    requesters: &'a DashSet<Uuid>,
    requester_id: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.requesters.remove(&self.requester_id);
    }
}

pub struct Submitter<D: ?Sized> {
    directory: Arc<D>,
    in_flight: DashSet<Uuid>,
    default_transport_number_length: usize,
}

impl<D> Submitter<D>
where
    D: ExpenseDirectory + ?Sized,
{
    pub fn new(directory: Arc<D>, default_transport_number_length: usize) -> Self {
        Self {
            directory,
            in_flight: DashSet::new(),
            default_transport_number_length,
        }
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// True while a submission from `requester_id` is running.
    pub fn is_busy(&self, requester_id: Uuid) -> bool {
        self.in_flight.contains(&requester_id)
    }

    /// Transport-number length from system settings, or the configured default.
    pub async fn transport_number_length(&self) -> Result<usize, SubmissionError> {
        Ok(self
            .directory
            .system_settings()
            .await?
            .map(|settings| settings.transport_number_length)
            .unwrap_or(self.default_transport_number_length))
    }

    /// Builds a claim form with the vehicle capacity and zones from the store.
    ///
    /// The vehicle must belong to `requester_id`; any other vehicle is
    /// reported as [`SubmissionError::IncompleteClaim`] on `vehicle_id`.
    #[instrument(skip(self, fields), fields(vehicle_id = ?fields.vehicle_id))]
    pub async fn load_form(
        &self,
        requester_id: Uuid,
        fields: ClaimFields,
    ) -> Result<ClaimForm, SubmissionError> {
        let zones = self.directory.zone_config().await?;
        let capacity = match fields.vehicle_id {
            Some(vehicle_id) => {
                let vehicle = self
                    .directory
                    .vehicle_config(vehicle_id)
                    .await?
                    .ok_or(SubmissionError::IncompleteClaim("vehicle_id"))?;
                if vehicle.carrier_id != requester_id {
                    warn!(carrier_id = %vehicle.carrier_id, "Vehicle belongs to another carrier");
                    return Err(SubmissionError::IncompleteClaim("vehicle_id"));
                }
                Some(vehicle.capacity_m3)
            }
            None => None,
        };

        Ok(ClaimForm::from_fields(fields, capacity, zones))
    }

    /// Validates and persists one submission.
    ///
    /// Returns [`SubmissionError::SubmissionInProgress`] when the same
    /// requester already has one running, and [`SubmitOutcome::Discarded`]
    /// when `cancel` fires first.
    #[instrument(skip_all, fields(requester_id = %submission.context.requester_id))]
    pub async fn submit(
        &self,
        submission: Submission,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, SubmissionError> {
        let requester_id = submission.context.requester_id;
        if !self.in_flight.insert(requester_id) {
            SUBMISSIONS_TOTAL
                .with_label_values(&[SubmissionError::SubmissionInProgress.kind()])
                .inc();
            return Err(SubmissionError::SubmissionInProgress);
        }
        let _in_flight = InFlight {
            requesters: &self.in_flight,
            requester_id,
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Submission cancelled, result discarded");
                Ok(SubmitOutcome::Discarded)
            }
            result = self.run(submission) => result.map(SubmitOutcome::Created),
        };

        let outcome = match &result {
            Ok(outcome) => outcome.label(),
            Err(err) => err.kind(),
        };
        SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();

        result
    }

    async fn run(&self, submission: Submission) -> Result<ExpenseRequest, SubmissionError> {
        let form = self
            .load_form(submission.context.requester_id, submission.fields)
            .await?;
        let draft = form.draft()?;
        let length = self.transport_number_length().await?;

        let validated = SubmissionValidator::new(self.directory.as_ref(), length)
            .validate(submission.context, draft)
            .await?;

        let claim_type = validated.draft.claim_type;
        let request = self
            .directory
            .persist_request(validated.into_request())
            .await
            .inspect_err(|e| warn!(error = %e, "Expense request not saved"))?;

        if let Ok(amount) = f64::try_from(request.total_amount) {
            REQUEST_AMOUNT_TOTAL
                .with_label_values(&[claim_type.as_str()])
                .inc_by(amount);
        }
        info!(
            request_id = %request.request_id,
            claim_type = claim_type.as_str(),
            total_amount = %request.total_amount,
            "Expense request created"
        );

        Ok(request)
    }
}
