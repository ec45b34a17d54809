use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub storage: StorageStatus,
}

/// Invoice storage backing this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageStatus {
    /// No `DATABASE_URL`; invoices live in process memory
    InMemory,
    Ok,
    Unreachable,
}

async fn storage_status(pool: Option<&MySqlPool>) -> StorageStatus {
    let Some(pool) = pool else {
        return StorageStatus::InMemory;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StorageStatus::Ok,
        Err(e) => {
            tracing::error!(error = %e, "Invoice store unreachable");
            StorageStatus::Unreachable
        }
    }
}

/// GET /health
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /ready, 503 while the invoice store cannot be reached
pub async fn readiness_check(pool: Option<web::Data<MySqlPool>>) -> impl Responder {
    let storage = storage_status(pool.as_ref().map(|p| p.get_ref())).await;
    let body = ReadinessResponse {
        ready: storage != StorageStatus::Unreachable,
        storage,
    };
    if body.ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(readiness_check));
}
