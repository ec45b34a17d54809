use crate::core::{AppError, Result};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

use super::{parse_or, Lookup};

/// MySQL settings. Absent entirely when DATABASE_URL is unset, in which case
/// invoices live in memory.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub(super) fn from_lookup(lookup: &Lookup<'_>) -> Result<Option<Self>> {
        let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };

        Ok(Some(DatabaseConfig {
            url,
            max_connections: parse_or(lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_or(lookup, "DATABASE_RUN_MIGRATIONS", true)?,
        }))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("mysql://") {
            return Err(AppError::Configuration(
                "DATABASE_URL must be a mysql:// URL".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(AppError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a MySQL connection pool
    pub async fn create_pool(&self) -> Result<MySqlPool> {
        let pool = MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600)) // 10 minutes
            .max_lifetime(Duration::from_secs(1800)) // 30 minutes
            .test_before_acquire(true)
            .connect(&self.url)
            .await?;

        if self.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| AppError::Configuration(format!("Migration failed: {}", e)))?;
        }

        Ok(pool)
    }
}
