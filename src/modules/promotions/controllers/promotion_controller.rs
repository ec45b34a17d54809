use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::{Currency, Result};
use crate::modules::invoices::models::LineItem;
use crate::modules::invoices::services::TotalsCalculator;
use crate::modules::promotions::models::Promotion;
use crate::modules::promotions::services::PromotionResolver;

/// Request body for POST /promotions/resolve
#[derive(Debug, Deserialize)]
pub struct ResolvePromotionRequest {
    pub code: String,
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Serialize)]
pub struct ResolvePromotionResponse {
    #[serde(flatten)]
    pub promotion: Promotion,
    pub formatted_discount: String,
}

/// Resolve a promotion code against an order
/// POST /promotions/resolve
pub async fn resolve_promotion(
    resolver: web::Data<PromotionResolver>,
    request: web::Json<ResolvePromotionRequest>,
) -> Result<HttpResponse> {
    let subtotal = TotalsCalculator::subtotal(&request.line_items, request.currency)?;
    let promotion = resolver.resolve(
        &request.code,
        subtotal,
        &request.line_items,
        request.currency,
        Utc::now(),
    )?;

    Ok(HttpResponse::Ok().json(ResolvePromotionResponse {
        formatted_discount: request.currency.format_amount(promotion.discount_amount),
        promotion,
    }))
}

/// Configure promotion routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/promotions").route("/resolve", web::post().to(resolve_promotion)));
}
