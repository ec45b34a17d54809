// HTTP flow tests against the in-memory repository
//
// Draft -> revise -> issue -> partial payment -> paid, plus the stateless
// totals, promotion and installment endpoints.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{test, App};
use helpers::*;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_invoice_lifecycle_over_http() {
    let state = test_state();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    // Create draft
    let req = test::TestRequest::post()
        .uri("/api/invoices")
        .set_json(TestDataFactory::draft_payload())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "draft");
    assert_eq!(decimal(&created["total"]), dec!(2180000));
    assert_eq!(created["version"], 1);
    assert_eq!(created["is_mutable"], true);
    let id = created["id"].as_str().unwrap().to_string();

    // Revise with a fixed promotion
    let mut revision = TestDataFactory::draft_with_promotion("flat200k");
    revision["expected_version"] = json!(1);
    let req = test::TestRequest::put()
        .uri(&format!("/api/invoices/{}", id))
        .set_json(revision)
        .to_request();
    let revised: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(decimal(&revised["discount_amount"]), dec!(200000));
    assert_eq!(decimal(&revised["total"]), dec!(1980000));
    assert_eq!(revised["promotion"]["code"], "FLAT200K");
    assert_eq!(revised["version"], 2);

    // Issue
    let req = test::TestRequest::post()
        .uri(&format!("/api/invoices/{}/issue", id))
        .set_json(json!({ "expected_version": 2 }))
        .to_request();
    let issued: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(issued["status"], "sent");
    assert_eq!(issued["is_mutable"], false);

    // Line items are frozen once issued
    let req = test::TestRequest::put()
        .uri(&format!("/api/invoices/{}", id))
        .set_json(TestDataFactory::draft_payload())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "illegal_transition");

    // Partial payment
    let req = test::TestRequest::post()
        .uri(&format!("/api/invoices/{}/payments", id))
        .set_json(json!({ "amount": "980000" }))
        .to_request();
    let partial: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(partial["status"], "partial");
    assert_eq!(decimal(&partial["remaining_balance"]), dec!(1000000));

    // Final payment
    let req = test::TestRequest::post()
        .uri(&format!("/api/invoices/{}/payments", id))
        .set_json(json!({ "amount": "1000000", "reference": "receipt-7" }))
        .to_request();
    let paid: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(paid["status"], "paid");
    assert_eq!(decimal(&paid["remaining_balance"]), dec!(0));
    assert_eq!(paid["payments"].as_array().unwrap().len(), 2);

    // Paid is terminal
    let req = test::TestRequest::post()
        .uri(&format!("/api/invoices/{}/cancel", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    // Listing by status
    let req = test::TestRequest::get()
        .uri("/api/invoices?status=paid")
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());
}

#[actix_web::test]
async fn test_cancel_draft_and_payment_method() {
    let state = test_state();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/invoices")
        .set_json(TestDataFactory::draft_payload())
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/invoices/{}/payment-method", id))
        .set_json(json!({ "payment_method": "bank_transfer" }))
        .to_request();
    let chosen: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(chosen["payment_method"], "bank_transfer");
    assert_eq!(chosen["status"], "draft");

    let req = test::TestRequest::post()
        .uri(&format!("/api/invoices/{}/cancel", id))
        .to_request();
    let cancelled: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cancelled["status"], "cancelled");

    let req = test::TestRequest::put()
        .uri(&format!("/api/invoices/{}/payment-method", id))
        .set_json(json!({ "payment_method": "cash" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn test_invalid_requests() {
    let state = test_state();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    // No line items
    let mut payload = TestDataFactory::draft_payload();
    payload["line_items"] = json!([]);
    let req = test::TestRequest::post()
        .uri("/api/invoices")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Unknown promotion
    let req = test::TestRequest::post()
        .uri("/api/invoices")
        .set_json(TestDataFactory::draft_with_promotion("BOGUS"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "promotion_invalid");

    // Unknown invoice
    let req = test::TestRequest::get()
        .uri(&format!("/api/invoices/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // Payment on a draft
    let req = test::TestRequest::post()
        .uri("/api/invoices")
        .set_json(TestDataFactory::draft_payload())
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/invoices/{}/payments", created["id"].as_str().unwrap()))
        .set_json(json!({ "amount": "1000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn test_totals_promotions_and_plans() {
    let state = test_state();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let mut totals_request = TestDataFactory::draft_with_promotion("SAVE10");
    totals_request
        .as_object_mut()
        .unwrap()
        .remove("client_id");
    let req = test::TestRequest::post()
        .uri("/api/totals")
        .set_json(totals_request)
        .to_request();
    let totals: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(decimal(&totals["subtotal"]), dec!(2000000));
    assert_eq!(decimal(&totals["tax_amount"]), dec!(180000));
    assert_eq!(decimal(&totals["discount_amount"]), dec!(200000));
    assert_eq!(decimal(&totals["total"]), dec!(1980000));
    assert_eq!(totals["formatted_total"], "IRT 1980000");

    let req = test::TestRequest::post()
        .uri("/api/promotions/resolve")
        .set_json(json!({
            "code": " ",
            "currency": "IRT",
            "line_items": [{ "description": "A", "quantity": 1, "unit_price": "1000" }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "promotion_empty");

    let req = test::TestRequest::post()
        .uri("/api/installments/plan")
        .set_json(json!({
            "total": "1200000",
            "currency": "IRT",
            "plan": {
                "is_installment": true,
                "down_payment": "200000",
                "installments_count": 5,
                "installment_amount": "200000"
            }
        }))
        .to_request();
    let plan: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(decimal(&plan["scheduled_total"]), dec!(1200000));
    assert_eq!(plan["period"], "monthly");

    let req = test::TestRequest::post()
        .uri("/api/installments/plan")
        .set_json(json!({
            "total": "1200000",
            "currency": "IRT",
            "plan": {
                "is_installment": true,
                "down_payment": "200000",
                "installments_count": 4,
                "installment_amount": "200000"
            }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);

    let req = test::TestRequest::post()
        .uri("/api/installments/suggest")
        .set_json(json!({
            "total": "1200000",
            "currency": "IRT",
            "down_payment": "200000",
            "installments_count": 4,
            "period": "quarterly"
        }))
        .to_request();
    let suggested: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(decimal(&suggested["installment_amount"]), dec!(250000));

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_out_of_range_amounts_are_client_errors() {
    let state = test_state();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let max = rust_decimal::Decimal::MAX.to_string();

    let req = test::TestRequest::post()
        .uri("/api/totals")
        .set_json(json!({
            "currency": "IRT",
            "tax_rate": "9",
            "line_items": [{ "description": "Big", "quantity": 2, "unit_price": max }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "validation_error");

    let mut payload = TestDataFactory::draft_payload();
    payload["line_items"][0]["unit_price"] = json!(max);
    let req = test::TestRequest::post()
        .uri("/api/invoices")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/installments/plan")
        .set_json(json!({
            "total": "1000",
            "currency": "IRT",
            "plan": {
                "is_installment": true,
                "down_payment": "0",
                "installments_count": 3,
                "installment_amount": max
            }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "plan_invalid");
}
