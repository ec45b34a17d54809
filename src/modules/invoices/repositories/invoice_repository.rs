// Invoice persistence with optimistic concurrency.
//
// Every write carries the version the caller read. A write succeeds only if
// the stored version still matches, and then bumps it by one; otherwise the
// caller gets ConcurrencyConflict and must reload.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{MySqlPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus};

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 100;

/// Filter and pagination for invoice listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl InvoiceFilter {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    fn matches(&self, invoice: &Invoice) -> bool {
        self.status.map_or(true, |s| invoice.status == s)
            && self
                .client_id
                .as_deref()
                .map_or(true, |c| invoice.client_id == c)
    }
}

/// Storage boundary for invoices
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Store a new invoice. The stored copy starts at version 1.
    async fn create(&self, invoice: &Invoice) -> Result<Invoice>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>>;

    /// Newest first
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>>;

    /// Replace the stored invoice if its version equals `expected_version`.
    ///
    /// # Errors
    /// * `NotFound` - no invoice with this id
    /// * `ConcurrencyConflict` - the stored version moved on
    async fn update(&self, invoice: &Invoice, expected_version: i64) -> Result<Invoice>;

    /// Sent invoices with nothing paid whose due date is before `as_of`
    async fn find_overdue_candidates(&self, as_of: NaiveDate) -> Result<Vec<Invoice>>;
}

fn conflict(id: Uuid, expected: i64, actual: i64) -> AppError {
    AppError::conflict(format!(
        "Invoice '{}' was modified concurrently (expected version {}, found {})",
        id, expected, actual
    ))
}

/// Process-local repository used by tests and when no database is configured
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: RwLock<HashMap<Uuid, Invoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn create(&self, invoice: &Invoice) -> Result<Invoice> {
        let mut invoices = self.invoices.write().await;
        if invoices.contains_key(&invoice.id) {
            return Err(AppError::validation(format!(
                "Invoice '{}' already exists",
                invoice.id
            )));
        }

        let mut stored = invoice.clone();
        stored.version = 1;
        invoices.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>> {
        Ok(self.invoices.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let invoices = self.invoices.read().await;
        let mut matching: Vec<Invoice> = invoices
            .values()
            .filter(|invoice| filter.matches(invoice))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect())
    }

    async fn update(&self, invoice: &Invoice, expected_version: i64) -> Result<Invoice> {
        let mut invoices = self.invoices.write().await;
        let current = invoices
            .get(&invoice.id)
            .ok_or_else(|| AppError::not_found(format!("Invoice with id '{}'", invoice.id)))?;

        if current.version != expected_version {
            return Err(conflict(invoice.id, expected_version, current.version));
        }

        let mut stored = invoice.clone();
        stored.version = expected_version + 1;
        invoices.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_overdue_candidates(&self, as_of: NaiveDate) -> Result<Vec<Invoice>> {
        let invoices = self.invoices.read().await;
        Ok(invoices
            .values()
            .filter(|invoice| {
                invoice.status == InvoiceStatus::Sent
                    && invoice.due_date < as_of
                    && invoice.amount_paid.is_zero()
            })
            .cloned()
            .collect())
    }
}

/// MySQL repository. The invoice is stored as a JSON document next to the
/// columns used for filtering and the optimistic check.
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn decode(row: &sqlx::mysql::MySqlRow) -> Result<Invoice> {
        let document: String = row.try_get("document")?;
        let version: i64 = row.try_get("version")?;

        let mut invoice: Invoice = serde_json::from_str(&document)
            .map_err(|e| AppError::internal(format!("Corrupt invoice document: {}", e)))?;
        // The column is authoritative for the version
        invoice.version = version;
        Ok(invoice)
    }
}

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn create(&self, invoice: &Invoice) -> Result<Invoice> {
        let mut stored = invoice.clone();
        stored.version = 1;
        let document = serde_json::to_string(&stored)?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, client_id, status, due_date, version, document, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(stored.id.to_string())
        .bind(&stored.client_id)
        .bind(stored.status.as_str())
        .bind(stored.due_date)
        .bind(stored.version)
        .bind(document)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::validation(format!(
                        "Invoice '{}' already exists",
                        stored.id
                    ));
                }
            }
            AppError::Database(e)
        })?;

        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>> {
        let row = sqlx::query("SELECT document, version FROM invoices WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let status = filter.status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
            SELECT document, version
            FROM invoices
            WHERE (? IS NULL OR status = ?)
              AND (? IS NULL OR client_id = ?)
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(status)
        .bind(status)
        .bind(filter.client_id.as_deref())
        .bind(filter.client_id.as_deref())
        .bind(filter.limit())
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode).collect()
    }

    async fn update(&self, invoice: &Invoice, expected_version: i64) -> Result<Invoice> {
        let mut stored = invoice.clone();
        stored.version = expected_version + 1;
        let document = serde_json::to_string(&stored)?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = ?, status = ?, due_date = ?, version = ?, document = ?, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&stored.client_id)
        .bind(stored.status.as_str())
        .bind(stored.due_date)
        .bind(stored.version)
        .bind(document)
        .bind(stored.updated_at)
        .bind(stored.id.to_string())
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT version FROM invoices WHERE id = ?")
                    .bind(stored.id.to_string())
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match current {
                None => AppError::not_found(format!("Invoice with id '{}'", stored.id)),
                Some(actual) => conflict(stored.id, expected_version, actual),
            });
        }

        Ok(stored)
    }

    async fn find_overdue_candidates(&self, as_of: NaiveDate) -> Result<Vec<Invoice>> {
        let rows = sqlx::query(
            r#"
            SELECT document, version
            FROM invoices
            WHERE status = 'sent' AND due_date < ?
            ORDER BY due_date
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        // amount_paid lives in the document
        let invoices: Vec<Invoice> = rows.iter().map(Self::decode).collect::<Result<_>>()?;
        Ok(invoices
            .into_iter()
            .filter(|invoice| invoice.amount_paid.is_zero())
            .collect())
    }
}
