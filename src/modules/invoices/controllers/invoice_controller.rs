use std::sync::Arc;

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::core::AppError;
use crate::modules::invoices::models::{
    InvoiceDraftRequest, InvoiceResponse, PaymentMethodRequest, RecordPaymentRequest,
    TotalsRequest, TransitionRequest,
};
use crate::modules::invoices::repositories::InvoiceFilter;
use crate::modules::invoices::services::InvoiceService;

/// Compute totals without storing an invoice
/// POST /totals
pub async fn compute_totals(
    service: web::Data<Arc<InvoiceService>>,
    request: web::Json<TotalsRequest>,
) -> Result<HttpResponse, AppError> {
    let response = service.preview_totals(&request)?;
    Ok(HttpResponse::Ok().json(response))
}

/// Create a draft invoice
/// POST /invoices
pub async fn create_invoice(
    service: web::Data<Arc<InvoiceService>>,
    request: web::Json<InvoiceDraftRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.create_draft(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(InvoiceResponse::from(invoice)))
}

/// List invoices
/// GET /invoices?status=&client_id=&limit=&offset=
pub async fn list_invoices(
    service: web::Data<Arc<InvoiceService>>,
    query: web::Query<InvoiceFilter>,
) -> Result<HttpResponse, AppError> {
    let invoices: Vec<InvoiceResponse> = service
        .list(&query)
        .await?
        .into_iter()
        .map(InvoiceResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(invoices))
}

/// GET /invoices/{id}
pub async fn get_invoice(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// Revise a draft invoice
/// PUT /invoices/{id}
pub async fn revise_invoice(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<Uuid>,
    request: web::Json<InvoiceDraftRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service
        .revise_draft(path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// POST /invoices/{id}/issue
pub async fn issue_invoice(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<Uuid>,
    request: Option<web::Json<TransitionRequest>>,
) -> Result<HttpResponse, AppError> {
    let expected_version = request.and_then(|r| r.expected_version);
    let invoice = service.issue(path.into_inner(), expected_version).await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// Record a manual payment
/// POST /invoices/{id}/payments
pub async fn record_payment(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<Uuid>,
    request: web::Json<RecordPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let invoice = service
        .record_payment(
            path.into_inner(),
            request.amount,
            request.reference,
            request.expected_version,
        )
        .await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// POST /invoices/{id}/cancel
pub async fn cancel_invoice(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<Uuid>,
    request: Option<web::Json<TransitionRequest>>,
) -> Result<HttpResponse, AppError> {
    let expected_version = request.and_then(|r| r.expected_version);
    let invoice = service.cancel(path.into_inner(), expected_version).await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// PUT /invoices/{id}/payment-method
pub async fn select_payment_method(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<Uuid>,
    request: web::Json<PaymentMethodRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service
        .select_payment_method(
            path.into_inner(),
            request.payment_method,
            request.expected_version,
        )
        .await?;
    Ok(HttpResponse::Ok().json(InvoiceResponse::from(invoice)))
}

/// Configure invoice routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/totals", web::post().to(compute_totals)).service(
        web::scope("/invoices")
            .route("", web::post().to(create_invoice))
            .route("", web::get().to(list_invoices))
            .route("/{id}", web::get().to(get_invoice))
            .route("/{id}", web::put().to(revise_invoice))
            .route("/{id}/issue", web::post().to(issue_invoice))
            .route("/{id}/payments", web::post().to(record_payment))
            .route("/{id}/cancel", web::post().to(cancel_invoice))
            .route("/{id}/payment-method", web::put().to(select_payment_method)),
    );
}
