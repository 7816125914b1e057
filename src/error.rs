use axum::response::{IntoResponse, Response};
use diesel::r2d2::PoolError;
use http::StatusCode;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    /// Amount is zero, negative, or outside the allowed range.
    InvalidAmount(String),
    /// A debit was requested for more than the wallet holds.
    InsufficientFunds { available: i64, requested: i64 },
    /// Bank account could not be resolved with the provider.
    AccountNotFound(String),
    /// Transient provider failure (network, timeout, 5xx). Safe to retry.
    GatewayUnavailable(String),
    /// The provider rejected the request outright (4xx). Not retryable.
    GatewayRejected(String),
    /// Webhook signature did not match the shared secret.
    InvalidSignature,
    /// Webhook or verify call referenced a payment we never created.
    UnknownPayment(String),
    /// Serialization failure on the atomic wallet update. Safe to retry.
    StorageConflict(String),
    /// User or bank-details lookup from the wider platform came back empty.
    NotFound(String),
    Database(diesel::result::Error),
    DatabaseConnection(String),
    Validation(validator::ValidationErrors),
    Auth(String),
    Internal(String),
}

impl ApiError {
    /// Errors the settlement coordinator may retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::GatewayUnavailable(_) | ApiError::StorageConflict(_)
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            ApiError::InsufficientFunds {
                available,
                requested,
            } => write!(
                f,
                "Insufficient funds: available {} kobo, requested {} kobo",
                available, requested
            ),
            ApiError::AccountNotFound(msg) => write!(f, "Account not found: {}", msg),
            ApiError::GatewayUnavailable(msg) => write!(f, "Payment gateway unavailable: {}", msg),
            ApiError::GatewayRejected(msg) => write!(f, "Payment gateway rejected request: {}", msg),
            ApiError::InvalidSignature => write!(f, "Invalid webhook signature"),
            ApiError::UnknownPayment(reference) => {
                write!(f, "Unknown payment reference: {}", reference)
            }
            ApiError::StorageConflict(msg) => write!(f, "Storage conflict: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Database(e) => write!(f, "Database error: {}", e),
            ApiError::DatabaseConnection(e) => write!(f, "Database connection error: {}", e),
            ApiError::Validation(e) => write!(f, "Validation error: {}", e),
            ApiError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Database(e) => Some(e),
            ApiError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        ApiError::DatabaseConnection(err.to_string())
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                ref info,
            ) => ApiError::StorageConflict(info.message().to_string()),
            other => ApiError::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status.is_client_error() {
                return ApiError::GatewayRejected(err.to_string());
            }
        }
        ApiError::GatewayUnavailable(err.to_string())
    }
}

impl From<ApiError> for (StatusCode, String) {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidAmount(msg) => (StatusCode::BAD_REQUEST, format!("Invalid amount: {}", msg)),
            ApiError::InsufficientFunds { available, .. } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Insufficient funds: available balance is \u{20a6}{:.2}",
                    available as f64 / 100.0
                ),
            ),
            ApiError::AccountNotFound(msg) => {
                (StatusCode::NOT_FOUND, format!("Account not found: {}", msg))
            }
            ApiError::GatewayUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Payment provider is unavailable, processing delayed".to_string(),
            ),
            ApiError::GatewayRejected(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Payment provider rejected the request: {}", msg),
            ),
            ApiError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "Invalid webhook signature".to_string(),
            ),
            ApiError::UnknownPayment(reference) => (
                StatusCode::NOT_FOUND,
                format!("Payment not found for reference: {}", reference),
            ),
            ApiError::StorageConflict(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporary storage conflict, processing delayed".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Database(e) => match e {
                diesel::result::Error::NotFound => {
                    (StatusCode::NOT_FOUND, "Record not found".to_string())
                }
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => (StatusCode::CONFLICT, format!("Database error: {}", e)),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Database error: {}", e),
                ),
            },
            ApiError::DatabaseConnection(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database connection error: {}", e),
            ),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                format!("Validation error: {}", errors),
            ),
            ApiError::Auth(msg) => (StatusCode::UNAUTHORIZED, format!("Auth error: {}", msg)),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {}", msg),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, String) = self.into();
        (status, body).into_response()
    }
}
