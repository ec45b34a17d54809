use std::sync::Arc;

use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use invoice_engine::config::{Config, LogFormat};
use invoice_engine::invoices::repositories::{
    InMemoryInvoiceRepository, InvoiceRepository, MySqlInvoiceRepository,
};
use invoice_engine::invoices::services::OverdueChecker;
use invoice_engine::promotions::repositories::InMemoryPromotionCatalog;
use invoice_engine::AppState;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));

    let registry = tracing_subscriber::registry().with(filter);
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!("Starting invoice engine");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    let catalog = match &config.invoices.promotions_file {
        Some(path) => InMemoryPromotionCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load promotions from {}", path.display()))?,
        None => InMemoryPromotionCatalog::new(),
    };
    tracing::info!(promotions = catalog.len(), "Promotion catalog ready");

    let (invoice_repo, pool) = match &config.database {
        Some(database) => {
            let pool = database
                .create_pool()
                .await
                .context("Failed to create database pool")?;
            tracing::info!(
                "Database pool initialized ({} connections)",
                database.max_connections
            );
            let repo: Arc<dyn InvoiceRepository> = Arc::new(MySqlInvoiceRepository::new(pool.clone()));
            (repo, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, invoices are kept in memory");
            let repo: Arc<dyn InvoiceRepository> = Arc::new(InMemoryInvoiceRepository::new());
            (repo, None)
        }
    };

    let mut state = AppState::new(
        invoice_repo,
        Arc::new(catalog),
        &config.webhook.secret,
        config.invoices.default_due_days,
    );
    if let Some(pool) = pool {
        state = state.with_pool(pool);
    }

    let checker = Arc::new(OverdueChecker::new(
        state.invoices.clone(),
        config.invoices.overdue_check_interval(),
    ));
    tokio::spawn(checker.start());

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let app_state = state.clone();
    let mut server = HttpServer::new(move || {
        let state = app_state.clone();
        App::new()
            .wrap(TracingLogger::default())
            .configure(move |cfg| state.configure(cfg))
    });
    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("Server error")
}
