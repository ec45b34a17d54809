use crate::core::{AppError, Result};

use super::{parse_or, Lookup};

/// HTTP listener settings read from `SERVER_*` variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Unset leaves the actix default of one worker per core
    pub workers: Option<usize>,
}

impl ServerConfig {
    pub(super) fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let workers = match lookup("SERVER_WORKERS") {
            Some(_) => Some(parse_or(lookup, "SERVER_WORKERS", 0usize)?),
            None => None,
        };
        if workers == Some(0) {
            return Err(AppError::Configuration(
                "SERVER_WORKERS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(lookup, "SERVER_PORT", 8080)?,
            workers,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
