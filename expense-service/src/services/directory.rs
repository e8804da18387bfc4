use async_trait::async_trait;
use uuid::Uuid;

use crate::claims::SubmissionError;
use crate::models::{
    Approver, ClaimType, CreateExpenseRequest, ExpenseRequest, ExpenseRequestSummary, MasterData,
    Recipient, SystemSettings, Vehicle, Zone,
};

/// Combination that may appear only once per requester.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    pub requester_id: Uuid,
    pub transport_number: String,
    pub claim_type: ClaimType,
    pub motive: String,
}

impl DuplicateKey {
    pub fn into_error(self) -> SubmissionError {
        SubmissionError::DuplicateRequest {
            transport_number: self.transport_number,
            claim_type: self.claim_type,
            motive: self.motive,
        }
    }
}

/// Everything the claim engine reads from or writes to the outside world.
///
/// Read failures are reported as [`SubmissionError::Lookup`]; a failed insert
/// as [`SubmissionError::PersistenceFailure`], or as
/// [`SubmissionError::DuplicateRequest`] when the store's uniqueness
/// constraint rejects it.
#[async_trait]
pub trait ExpenseDirectory: Send + Sync {
    async fn resolve_recipient_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Recipient>, SubmissionError>;

    async fn find_duplicate(&self, key: &DuplicateKey) -> Result<bool, SubmissionError>;

    async fn persist_request(
        &self,
        request: CreateExpenseRequest,
    ) -> Result<ExpenseRequest, SubmissionError>;

    async fn zone_config(&self) -> Result<Vec<Zone>, SubmissionError>;

    async fn vehicle_config(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>, SubmissionError>;

    /// `None` when no settings row has been saved yet.
    async fn system_settings(&self) -> Result<Option<SystemSettings>, SubmissionError>;

    async fn vehicles_for_carrier(&self, carrier_id: Uuid) -> Result<Vec<Vehicle>, SubmissionError>;

    async fn master_data(&self) -> Result<MasterData, SubmissionError>;

    async fn approvers(&self) -> Result<Vec<Approver>, SubmissionError>;

    /// True when `profile_id` has one of the approver roles.
    async fn is_approver(&self, profile_id: Uuid) -> Result<bool, SubmissionError>;

    /// True when `area_id` is an active attributable area.
    async fn area_exists(&self, area_id: Uuid) -> Result<bool, SubmissionError>;

    async fn requests_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<ExpenseRequestSummary>, SubmissionError>;
}
