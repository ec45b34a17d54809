use crate::core::{AppError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Source of configuration values, keyed by variable name
pub type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub invoices: InvoiceConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceConfig {
    /// Due date offset applied to drafts that do not set one
    pub default_due_days: i64,
    pub overdue_check_interval_secs: u64,
    /// JSON array of promotion definitions loaded at startup
    pub promotions_file: Option<PathBuf>,
}

impl InvoiceConfig {
    pub fn overdue_check_interval(&self) -> Duration {
        Duration::from_secs(self.overdue_check_interval_secs)
    }
}

#[derive(Clone)]
pub struct WebhookConfig {
    pub secret: String,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Parse `key` if set, otherwise fall back to `default`
pub(crate) fn parse_or<T: FromStr>(lookup: &Lookup<'_>, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}: '{}'", key, raw))),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Configuration(format!("Invalid LOG_FORMAT: {}", e))
            })?,
            None => LogFormat::Pretty,
        };

        Ok(Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                log_format,
            },
            server: ServerConfig::from_lookup(lookup)?,
            database: DatabaseConfig::from_lookup(lookup)?,
            invoices: InvoiceConfig {
                default_due_days: parse_or(lookup, "DEFAULT_DUE_DAYS", 30)?,
                overdue_check_interval_secs: parse_or(lookup, "OVERDUE_CHECK_INTERVAL_SECS", 300)?,
                promotions_file: lookup("PROMOTIONS_FILE")
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
            },
            webhook: WebhookConfig {
                secret: lookup("WEBHOOK_SECRET")
                    .ok_or_else(|| AppError::Configuration("WEBHOOK_SECRET not set".to_string()))?,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.invoices.default_due_days < 0 {
            return Err(AppError::Configuration(
                "DEFAULT_DUE_DAYS cannot be negative".to_string(),
            ));
        }

        if self.invoices.overdue_check_interval_secs == 0 {
            return Err(AppError::Configuration(
                "Overdue check interval must be greater than 0".to_string(),
            ));
        }

        if self.webhook.secret.trim().len() < 16 {
            return Err(AppError::Configuration(
                "WEBHOOK_SECRET must be at least 16 characters".to_string(),
            ));
        }

        if let Some(database) = &self.database {
            database.validate()?;
        }

        Ok(())
    }

    /// Default tracing filter when RUST_LOG is unset
    pub fn default_log_filter(&self) -> String {
        format!("invoice_engine={},actix_web=info", self.app.log_level)
    }
}
