// HTTP handlers for installment planning
//
// Endpoints:
// - POST /installments/plan - Validate a requested plan against a total
// - POST /installments/suggest - Derive the installment amount for a total

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};
use crate::modules::installments::models::{InstallmentPeriod, PaymentPlan, PaymentPlanRequest};
use crate::modules::installments::services::InstallmentPlanner;

/// Request body for POST /installments/plan
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub total: Decimal,
    pub currency: Currency,
    pub plan: PaymentPlanRequest,
}

/// Request body for POST /installments/suggest
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub total: Decimal,
    pub currency: Currency,
    #[serde(default)]
    pub down_payment: Decimal,
    pub installments_count: u32,
    #[serde(default)]
    pub period: InstallmentPeriod,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub total: Decimal,
    pub currency: Currency,
    #[serde(flatten)]
    pub plan: PaymentPlan,
    pub scheduled_total: Decimal,
}

impl PlanResponse {
    fn new(total: Decimal, currency: Currency, plan: PaymentPlan) -> Result<Self> {
        Ok(Self {
            scheduled_total: plan.scheduled_total()?,
            total,
            currency,
            plan,
        })
    }
}

fn check_total(total: Decimal, currency: Currency) -> Result<()> {
    currency
        .validate_amount(total)
        .map_err(|e| AppError::validation(format!("Invalid total: {}", e)))
}

/// Handler for POST /installments/plan
pub async fn build_plan(request: web::Json<PlanRequest>) -> Result<HttpResponse> {
    check_total(request.total, request.currency)?;
    let plan = InstallmentPlanner::build_plan(request.total, &request.plan, request.currency)?;
    Ok(HttpResponse::Ok().json(PlanResponse::new(request.total, request.currency, plan)?))
}

/// Handler for POST /installments/suggest
pub async fn suggest_plan(request: web::Json<SuggestRequest>) -> Result<HttpResponse> {
    check_total(request.total, request.currency)?;
    let plan = InstallmentPlanner::suggest(
        request.total,
        request.down_payment,
        request.installments_count,
        request.period,
        request.currency,
    )?;
    Ok(HttpResponse::Ok().json(PlanResponse::new(request.total, request.currency, plan)?))
}

/// Configure installment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/installments")
            .route("/plan", web::post().to(build_plan))
            .route("/suggest", web::post().to(suggest_plan)),
    );
}
