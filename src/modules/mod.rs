pub mod health;
pub mod installments;
pub mod invoices;
pub mod promotions;
pub mod transactions;

use std::sync::Arc;

use actix_web::web;
use sqlx::MySqlPool;

use crate::middleware::{json_config, path_config, query_config};
use invoices::repositories::{InMemoryInvoiceRepository, InvoiceRepository};
use invoices::services::InvoiceService;
use promotions::repositories::PromotionCatalog;
use promotions::services::PromotionResolver;
use transactions::services::{ReconciliationService, WebhookVerifier};

/// Services shared by every worker
#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<InvoiceService>,
    pub resolver: PromotionResolver,
    pub reconciliation: Arc<ReconciliationService>,
    pub verifier: WebhookVerifier,
    pub pool: Option<MySqlPool>,
}

impl AppState {
    pub fn new(
        invoice_repo: Arc<dyn InvoiceRepository>,
        catalog: Arc<dyn PromotionCatalog>,
        webhook_secret: &str,
        default_due_days: i64,
    ) -> Self {
        let resolver = PromotionResolver::new(catalog);
        let invoices = Arc::new(InvoiceService::new(
            invoice_repo,
            resolver.clone(),
            default_due_days,
        ));

        Self {
            reconciliation: Arc::new(ReconciliationService::new(invoices.clone())),
            invoices,
            resolver,
            verifier: WebhookVerifier::new(webhook_secret),
            pool: None,
        }
    }

    /// State backed by the in-memory invoice repository
    pub fn in_memory(catalog: Arc<dyn PromotionCatalog>, webhook_secret: &str) -> Self {
        Self::new(
            Arc::new(InMemoryInvoiceRepository::new()),
            catalog,
            webhook_secret,
            30,
        )
    }

    pub fn with_pool(mut self, pool: MySqlPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Register shared data and every route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .app_data(web::Data::new(self.invoices.clone()))
            .app_data(web::Data::new(self.resolver.clone()))
            .app_data(web::Data::new(self.reconciliation.clone()))
            .app_data(web::Data::new(self.verifier.clone()));

        if let Some(pool) = &self.pool {
            cfg.app_data(web::Data::new(pool.clone()));
        }

        cfg.configure(health::controllers::configure).service(
            web::scope("/api")
                .configure(invoices::controllers::configure)
                .configure(promotions::controllers::configure)
                .configure(installments::controllers::configure)
                .configure(transactions::controllers::configure),
        );
    }
}
