//! Lookup handlers that feed the claim form pickers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use tracing::instrument;

use crate::{
    claims::{recipient::MIN_CODE_LENGTH, RecipientLookup},
    dtos::{ApproverListResponse, VehicleListResponse},
    middleware::Requester,
    models::MasterData,
    services::metrics::RECIPIENT_LOOKUPS_TOTAL,
    AppState,
};

#[instrument(skip(state))]
pub async fn master_data(State(state): State<AppState>) -> Result<Json<MasterData>, AppError> {
    Ok(Json(state.directory.master_data().await?))
}

#[instrument(skip(state))]
pub async fn list_approvers(
    State(state): State<AppState>,
) -> Result<Json<ApproverListResponse>, AppError> {
    let approvers = state.directory.approvers().await?;
    Ok(Json(ApproverListResponse { approvers }))
}

/// Vehicles registered to the requesting carrier.
#[instrument(skip(state), fields(requester_id = %requester.0))]
pub async fn list_vehicles(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<VehicleListResponse>, AppError> {
    let vehicles = state.directory.vehicles_for_carrier(requester.0).await?;
    Ok(Json(VehicleListResponse { vehicles }))
}

/// Resolve a recipient code as it is typed.
///
/// Answers 204 when a newer lookup from the same requester superseded this one.
#[instrument(skip(state), fields(requester_id = %requester.0))]
pub async fn lookup_recipient(
    State(state): State<AppState>,
    requester: Requester,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let lookup = state.resolver.lookup(requester.0, &code).await?;

    let result = match &lookup {
        RecipientLookup::Found(_) => "found",
        RecipientLookup::NotFound => "not_found",
        RecipientLookup::TooShort => "too_short",
        RecipientLookup::Superseded => "superseded",
    };
    RECIPIENT_LOOKUPS_TOTAL.with_label_values(&[result]).inc();

    match lookup {
        RecipientLookup::Found(recipient) => Ok(Json(recipient).into_response()),
        RecipientLookup::NotFound => Err(AppError::NotFound(anyhow::anyhow!(
            "Invalid recipient code"
        ))),
        RecipientLookup::TooShort => Err(AppError::BadRequest(anyhow::anyhow!(
            "Recipient code must have at least {} characters",
            MIN_CODE_LENGTH
        ))),
        RecipientLookup::Superseded => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
