use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::core::{AppError, Result};
use crate::modules::invoices::services::invoice_service::InvoiceService;

/// Background job that marks sent invoices overdue once their due date passes
///
/// Spawned from main.rs as a tokio task. Each pass lists the candidates and
/// applies MarkOverdue to each through the invoice service; an invoice that
/// changed in the meantime is skipped and picked up on a later pass if it
/// still qualifies.
pub struct OverdueChecker {
    invoice_service: Arc<InvoiceService>,
    period: Duration,
}

impl OverdueChecker {
    pub fn new(invoice_service: Arc<InvoiceService>, period: Duration) -> Self {
        Self {
            invoice_service,
            period,
        }
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            period_secs = self.period.as_secs(),
            "Starting invoice overdue checker"
        );

        let mut ticker = interval(self.period);

        loop {
            ticker.tick().await;

            match self.run_once(Utc::now()).await {
                Ok(marked) => {
                    if marked > 0 {
                        info!(marked_count = marked, "Overdue invoices processed");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error checking overdue invoices");
                }
            }
        }
    }

    /// One pass as of `now`; returns how many invoices were marked
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let candidates = self.invoice_service.overdue_candidates(now).await?;
        let mut marked = 0;

        for invoice in candidates {
            match self.invoice_service.mark_overdue(invoice.id, now).await {
                Ok(updated) => {
                    info!(
                        invoice_id = %updated.id,
                        due_date = %updated.due_date,
                        "Invoice marked overdue"
                    );
                    marked += 1;
                }
                // Paid, cancelled or otherwise moved on since it was listed
                Err(e @ (AppError::ConcurrencyConflict(_) | AppError::IllegalTransition { .. })) => {
                    warn!(invoice_id = %invoice.id, error = %e, "Skipped overdue candidate");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(marked)
    }
}
