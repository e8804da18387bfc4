//! Expense request handlers.
//!
//! Requests are always scoped to the requester from `X-User-ID`.

use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    claims::SubmitOutcome,
    dtos::{
        CreateExpenseRequestDto, ExpenseRequestListResponse, ExpenseRequestResponse,
        QuoteRequest, QuoteResponse,
    },
    middleware::Requester,
    services::metrics::QUOTES_TOTAL,
    utils::{today_in_lima, ValidatedJson},
    AppState,
};

/// Validate and persist a new expense request.
#[instrument(skip(state, payload), fields(requester_id = %requester.0))]
pub async fn create_expense_request(
    State(state): State<AppState>,
    requester: Requester,
    ValidatedJson(payload): ValidatedJson<CreateExpenseRequestDto>,
) -> Result<(StatusCode, Json<ExpenseRequestResponse>), AppError> {
    let submission = payload.into_submission(requester.0, today_in_lima());

    // Independent of server shutdown, which drains running requests. A dropped
    // connection drops this future and frees the requester's in-flight slot.
    let cancel = CancellationToken::new();

    match state.submitter.submit(submission, &cancel).await? {
        SubmitOutcome::Created(request) => Ok((
            StatusCode::CREATED,
            Json(ExpenseRequestResponse::from(request)),
        )),
        SubmitOutcome::Discarded => Err(AppError::ServiceUnavailable),
    }
}

/// Compute the amount a claim would carry, without submitting it.
#[instrument(
    skip(state, payload),
    fields(requester_id = %requester.0, claim_type = payload.claim_type.as_str())
)]
pub async fn quote_expense_request(
    State(state): State<AppState>,
    requester: Requester,
    ValidatedJson(payload): ValidatedJson<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let claim_type = payload.claim_type;
    let form = state
        .submitter
        .load_form(requester.0, payload.into())
        .await?;
    let response = QuoteResponse::from_form(claim_type, &form);

    QUOTES_TOTAL
        .with_label_values(&[claim_type.as_str(), response.result])
        .inc();

    Ok(Json(response))
}

/// List the requester's own expense requests, newest first.
#[instrument(skip(state), fields(requester_id = %requester.0))]
pub async fn list_my_expense_requests(
    State(state): State<AppState>,
    requester: Requester,
) -> Result<Json<ExpenseRequestListResponse>, AppError> {
    let requests = state
        .directory
        .requests_for_requester(requester.0)
        .await?;

    Ok(Json(ExpenseRequestListResponse {
        count: requests.len(),
        requests,
    }))
}
