//! Error types for the asset tracker

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Postgres SQLSTATE for unique constraint violations
pub const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for foreign key violations
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Application error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    Duplicate = 6,
    AssetNotAvailable = 7,
    IssueNotActive = 8,
    DomainRejected = 9,
    UpstreamFailure = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Account rejected: {0}")]
    DomainRejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A unique value already exists; `field` names the offending input
    #[error("Duplicate {field}: {message}")]
    Duplicate { field: String, message: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl AppError {
    pub fn duplicate(field: &str, message: &str) -> Self {
        AppError::Duplicate {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Map a unique-constraint violation to a field-level duplicate error.
    ///
    /// `constraints` pairs a constraint-name fragment with the field and
    /// message to report. Errors that are not unique violations, or whose
    /// constraint is not listed, pass through unchanged.
    pub fn from_unique_violation(err: sqlx::Error, constraints: &[(&str, &str, &str)]) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let haystack = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                for (fragment, field, message) in constraints {
                    if haystack.contains(fragment) {
                        return AppError::duplicate(field, message);
                    }
                }
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        AppError::Database(err)
    }

    /// Map a foreign-key violation (row still referenced) to a conflict
    pub fn from_reference_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                return AppError::Conflict(message.to_string());
            }
        }
        AppError::Database(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Input field the error refers to, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String, Option<String>) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone(), None)
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone(), None)
            }
            AppError::DomainRejected(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::DomainRejected, msg.clone(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone(), None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone(), None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone(), None),
            AppError::Duplicate { field, message } => (
                StatusCode::CONFLICT,
                ErrorCode::Duplicate,
                message.clone(),
                Some(field.clone()),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, ErrorCode::UpstreamFailure, msg.clone(), None)
            }
            AppError::BusinessRule(msg) => {
                let code = if msg.contains("not available") {
                    ErrorCode::AssetNotAvailable
                } else if msg.contains("not active") {
                    ErrorCode::IssueNotActive
                } else {
                    ErrorCode::Failure
                };
                (StatusCode::UNPROCESSABLE_ENTITY, code, msg.clone(), None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            field,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_conflict_with_field() {
        let err = AppError::duplicate("asset_code", "Asset code already exists");
        let (status, code, message, field) = err.parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, ErrorCode::Duplicate);
        assert_eq!(message, "Asset code already exists");
        assert_eq!(field.as_deref(), Some("asset_code"));
    }

    #[test]
    fn test_database_error_message_is_hidden() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        let (status, _, message, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Database error");
    }

    #[test]
    fn test_non_unique_errors_pass_through() {
        let err = AppError::from_unique_violation(
            sqlx::Error::RowNotFound,
            &[("asset_code", "asset_code", "Asset code already exists")],
        );
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_business_rule_codes() {
        let (status, code, _, _) =
            AppError::BusinessRule("Asset CUT-LAP-001 is not available (issued)".into()).parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, ErrorCode::AssetNotAvailable);

        let (_, code, _, _) = AppError::BusinessRule("Issue is not active".into()).parts();
        assert_eq!(code, ErrorCode::IssueNotActive);
    }

    #[test]
    fn test_domain_rejection_is_forbidden() {
        let (status, code, _, _) = AppError::DomainRejected("nope".into()).parts();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, ErrorCode::DomainRejected);
    }
}
