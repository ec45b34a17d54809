// Optimistic concurrency on invoice writes
//
// Every write carries the version it was based on; a stale version loses
// with 409 concurrency_conflict and leaves the stored invoice untouched.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{test, App};
use chrono::Utc;
use helpers::*;
use invoice_engine::core::AppError;
use invoice_engine::invoices::models::InvoiceStatus;
use invoice_engine::invoices::InvoiceEvent;
use invoice_engine::transactions::models::{ReconciliationEvent, ReconciliationOutcome};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_stale_version_rejected_over_http() {
    let state = test_state();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let draft = draft_invoice(&state).await;
    assert_eq!(draft.version, 1);

    // First revision based on version 1 wins
    let mut revision = TestDataFactory::draft_with_promotion("SAVE10");
    revision["expected_version"] = json!(1);
    let req = test::TestRequest::put()
        .uri(&format!("/api/invoices/{}", draft.id))
        .set_json(&revision)
        .to_request();
    let revised: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(revised["version"], 2);

    // Second revision based on the same version loses
    let mut stale = TestDataFactory::draft_with_promotion("FLAT200K");
    stale["expected_version"] = json!(1);
    let req = test::TestRequest::put()
        .uri(&format!("/api/invoices/{}", draft.id))
        .set_json(&stale)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error"]["kind"], "concurrency_conflict");

    // Issue with a stale version
    let req = test::TestRequest::post()
        .uri(&format!("/api/invoices/{}/issue", draft.id))
        .set_json(json!({ "expected_version": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let stored = state.invoices.get(draft.id).await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.status, InvoiceStatus::Draft);
    assert_eq!(stored.promotion.unwrap().code.as_deref(), Some("SAVE10"));
}

#[tokio::test]
async fn test_payments_from_same_version_one_wins() {
    let state = test_state();
    let invoice = issued_invoice(&state).await;
    let now = Utc::now();

    let first = state.invoices.apply_event(
        invoice.id,
        InvoiceEvent::RecordPayment {
            amount: dec!(1000000),
            gateway_ref: Some("a".to_string()),
        },
        Some(invoice.version),
        now,
    );
    let second = state.invoices.apply_event(
        invoice.id,
        InvoiceEvent::RecordPayment {
            amount: dec!(1000000),
            gateway_ref: Some("b".to_string()),
        },
        Some(invoice.version),
        now,
    );
    let (first, second) = tokio::join!(first, second);

    let results = [first, second];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::ConcurrencyConflict(_))))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);

    let stored = state.invoices.get(invoice.id).await.unwrap();
    assert_eq!(stored.amount_paid, dec!(1000000));
    assert_eq!(stored.payments.len(), 1);
    assert_eq!(stored.version, invoice.version + 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_settlement_applied_once() {
    let state = test_state();
    let invoice = issued_invoice(&state).await;

    let event = ReconciliationEvent {
        invoice_id: invoice.id,
        amount_settled: dec!(2180000),
        gateway_ref: "zp-dup".to_string(),
    };

    let (first, second) = tokio::join!(
        state.reconciliation.reconcile(&event),
        state.reconciliation.reconcile(&event)
    );

    // Either the second delivery saw the first (duplicate) or raced it (conflict)
    let applied = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Ok(ReconciliationOutcome::Applied { .. })))
        .count();
    assert_eq!(applied, 1);
    for result in [&first, &second] {
        assert!(matches!(
            result,
            Ok(ReconciliationOutcome::Applied { .. })
                | Ok(ReconciliationOutcome::Duplicate { .. })
                | Err(AppError::ConcurrencyConflict(_))
        ));
    }

    // A gateway retry after the race is a duplicate
    let retry = state.reconciliation.reconcile(&event).await.unwrap();
    assert!(matches!(retry, ReconciliationOutcome::Duplicate { .. }));

    let stored = state.invoices.get(invoice.id).await.unwrap();
    assert_eq!(stored.status, InvoiceStatus::Paid);
    assert_eq!(stored.payments.len(), 1);
}

#[tokio::test]
async fn test_unversioned_writes_still_serialize() {
    let state = test_state();
    let invoice = issued_invoice(&state).await;

    let partial = state
        .invoices
        .record_payment(invoice.id, dec!(180000), None, None)
        .await
        .unwrap();
    assert_eq!(partial.status, InvoiceStatus::Partial);
    assert_eq!(partial.version, invoice.version + 1);

    let paid = state
        .invoices
        .record_payment(invoice.id, dec!(2000000), None, None)
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.version, invoice.version + 2);
}
