// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get stable error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::manager::DatabaseError::ConfigMissing(_)
            | crate::database::manager::DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::manager::DatabaseError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            other => {
                tracing::error!("SQLx error: {}", other);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::scope::ScopeError> for ApiError {
    fn from(err: crate::scope::ScopeError) -> Self {
        match err {
            crate::scope::ScopeError::MissingSite | crate::scope::ScopeError::MissingFranchise => {
                ApiError::forbidden(err.to_string())
            }
            crate::scope::ScopeError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::analytics::periods::PeriodError> for ApiError {
    fn from(err: crate::analytics::periods::PeriodError) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(err.field().to_string(), err.to_string());
        ApiError::validation_error(err.to_string(), Some(field_errors))
    }
}

impl From<crate::services::franchise_service::FranchiseError> for ApiError {
    fn from(err: crate::services::franchise_service::FranchiseError) -> Self {
        use crate::services::franchise_service::FranchiseError;
        match err {
            FranchiseError::NotFound(_) | FranchiseError::SiteNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            FranchiseError::SiteClaimed { .. }
            | FranchiseError::SiteNotMember { .. }
            | FranchiseError::HasSites { .. } => ApiError::conflict(err.to_string()),
            FranchiseError::Database(e) => e.into(),
            FranchiseError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::client_service::ClientError> for ApiError {
    fn from(err: crate::services::client_service::ClientError) -> Self {
        use crate::services::client_service::ClientError;
        match err {
            ClientError::NotFound(_) | ClientError::PageOutOfRange { .. } => {
                ApiError::not_found(err.to_string())
            }
            ClientError::SiteNotFound(_) | ClientError::SiteRequired => {
                ApiError::bad_request(err.to_string())
            }
            ClientError::DuplicateContact { .. } => ApiError::conflict(err.to_string()),
            ClientError::Forbidden(_) => ApiError::forbidden(err.to_string()),
            ClientError::Database(e) => e.into(),
            ClientError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::catalog_service::CatalogError> for ApiError {
    fn from(err: crate::services::catalog_service::CatalogError) -> Self {
        use crate::services::catalog_service::CatalogError;
        match err {
            CatalogError::NotFound(_) => ApiError::not_found(err.to_string()),
            CatalogError::Forbidden(_) => ApiError::forbidden(err.to_string()),
            CatalogError::InvalidIdFormat(_) => ApiError::bad_request(err.to_string()),
            CatalogError::Database(e) => e.into(),
            CatalogError::Sqlx(e) => e.into(),
        }
    }
}

impl From<crate::services::commission_service::CommissionError> for ApiError {
    fn from(err: crate::services::commission_service::CommissionError) -> Self {
        use crate::services::commission_service::CommissionError;
        match err {
            CommissionError::NotFound(_) => ApiError::not_found(err.to_string()),
            CommissionError::AlreadySettled(_) => ApiError::conflict(err.to_string()),
            CommissionError::Forbidden(_) => ApiError::forbidden(err.to_string()),
            CommissionError::Database(e) => e.into(),
            CommissionError::Sqlx(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
