use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
///
/// The first six variants are the engine's own failures and are always
/// recoverable by the caller correcting input or reloading the invoice.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Malformed line items, tax rate, amounts or dates
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown, expired or inapplicable promotion code
    #[error("Promotion invalid: {0}")]
    PromotionInvalid(String),

    /// Blank promotion code
    #[error("Promotion code is empty")]
    PromotionEmpty,

    /// Installment arithmetic does not add up to the invoice total
    #[error("Payment plan invalid: {0}")]
    PlanInvalid(String),

    /// Lifecycle guard violation
    #[error("Illegal transition: cannot {action} an invoice in status '{from}'")]
    IllegalTransition { from: String, action: String },

    /// Stale write rejected by the optimistic check
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Webhook signature rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Storage and internal failures are logged, not echoed to the caller
        let message = match self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed with server error");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "code": status_code.as_u16(),
                "kind": self.kind(),
                "message": message,
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PromotionInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PromotionEmpty => StatusCode::BAD_REQUEST,
            AppError::PlanInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn promotion_invalid(msg: impl Into<String>) -> Self {
        AppError::PromotionInvalid(msg.into())
    }

    pub fn plan_invalid(msg: impl Into<String>) -> Self {
        AppError::PlanInvalid(msg.into())
    }

    pub fn illegal_transition(from: impl ToString, action: impl Into<String>) -> Self {
        AppError::IllegalTransition {
            from: from.to_string(),
            action: action.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::ConcurrencyConflict(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Stable machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::PromotionInvalid(_) => "promotion_invalid",
            AppError::PromotionEmpty => "promotion_empty",
            AppError::PlanInvalid(_) => "plan_invalid",
            AppError::IllegalTransition { .. } => "illegal_transition",
            AppError::ConcurrencyConflict(_) => "concurrency_conflict",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Database(_) => "database_error",
            AppError::Json(_) => "json_error",
            AppError::Configuration(_) => "configuration_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}
