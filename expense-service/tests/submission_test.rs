mod common;

use common::{dec, Fixture};
use expense_service::claims::{SubmissionError, SubmitOutcome, Submitter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_computed_amount_replaces_client_amount() {
    let fixture = Fixture::new();
    let submitter = Submitter::new(fixture.directory.clone(), 8);

    let mut fields = fixture.under_minimum_fields();
    fields.amount = Some(dec("9999"));
    let outcome = submitter
        .submit(fixture.submission(fields), &CancellationToken::new())
        .await
        .unwrap();

    let SubmitOutcome::Created(request) = outcome else {
        panic!("expected a created request");
    };
    assert_eq!(request.total_amount, dec("100.00"));
    assert_eq!(request.claim_type, "under_minimum_load");
    assert_eq!(request.motive, "Sin stock");
    assert_eq!(request.status, "pending");
    // Channel falls back to the recipient's
    assert_eq!(request.channel, "Mayorista");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_submission_is_discarded() {
    let fixture = Fixture::new();
    *fixture.directory.persist_delay.lock().unwrap() = Some(Duration::from_secs(1));
    let submitter = Arc::new(Submitter::new(fixture.directory.clone(), 8));
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let submitter = submitter.clone();
        let cancel = cancel.clone();
        let submission = fixture.submission(fixture.under_minimum_fields());
        async move { submitter.submit(submission, &cancel).await }
    });

    while !submitter.is_busy(fixture.requester_id) {
        tokio::task::yield_now().await;
    }
    cancel.cancel();

    let outcome = task.await.unwrap().unwrap();
    assert!(matches!(outcome, SubmitOutcome::Discarded));
    assert_eq!(fixture.directory.request_count(), 0);
    assert!(!submitter.is_busy(fixture.requester_id));
}

#[tokio::test]
async fn test_already_cancelled_token_discards_without_persisting() {
    let fixture = Fixture::new();
    let submitter = Submitter::new(fixture.directory.clone(), 8);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = submitter
        .submit(fixture.submission(fixture.under_minimum_fields()), &cancel)
        .await
        .unwrap();

    assert!(matches!(outcome, SubmitOutcome::Discarded));
    assert_eq!(fixture.directory.request_count(), 0);
    assert_eq!(fixture.directory.lookups(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_second_submission_while_busy_is_refused() {
    let fixture = Fixture::new();
    *fixture.directory.persist_delay.lock().unwrap() = Some(Duration::from_secs(1));
    let submitter = Arc::new(Submitter::new(fixture.directory.clone(), 8));

    let first = tokio::spawn({
        let submitter = submitter.clone();
        let submission = fixture.submission(fixture.under_minimum_fields());
        async move {
            submitter
                .submit(submission, &CancellationToken::new())
                .await
        }
    });

    while !submitter.is_busy(fixture.requester_id) {
        tokio::task::yield_now().await;
    }

    let second = submitter
        .submit(
            fixture.submission(fixture.last_point_fields("2 estibas")),
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(second.unwrap_err(), SubmissionError::SubmissionInProgress);

    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, SubmitOutcome::Created(_)));
    assert!(!submitter.is_busy(fixture.requester_id));

    // Free again once the first one finished
    let third = submitter
        .submit(
            fixture.submission(fixture.last_point_fields("2 estibas")),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(matches!(third, SubmitOutcome::Created(_)));
}

#[tokio::test]
async fn test_failed_submission_releases_busy_flag() {
    let fixture = Fixture::new();
    let submitter = Submitter::new(fixture.directory.clone(), 8);

    let mut fields = fixture.under_minimum_fields();
    fields.transport_number = "1".to_string();
    let err = submitter
        .submit(fixture.submission(fields), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SubmissionError::InvalidTransportNumberLength { .. }
    ));
    assert!(!submitter.is_busy(fixture.requester_id));
}

#[tokio::test]
async fn test_load_form_uses_vehicle_capacity_and_zone() {
    let fixture = Fixture::new();
    let submitter = Submitter::new(fixture.directory.clone(), 8);

    {
        let mut zones = fixture.directory.zones.lock().unwrap();
        zones[0].minimum_load_percentage = Some(dec("85"));
    }

    let form = submitter
        .load_form(fixture.requester_id, fixture.under_minimum_fields())
        .await
        .unwrap();
    assert_eq!(form.amount(), Some(dec("150.00")));
}

#[tokio::test]
async fn test_load_form_rejects_another_carriers_vehicle() {
    let fixture = Fixture::new();
    let submitter = Submitter::new(fixture.directory.clone(), 8);

    let mut fields = fixture.under_minimum_fields();
    fields.vehicle_id = Some(fixture.add_foreign_vehicle("1000"));
    let err = submitter
        .load_form(fixture.requester_id, fields)
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::IncompleteClaim("vehicle_id"));
}
