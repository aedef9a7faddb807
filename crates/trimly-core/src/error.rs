//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all layers of Trimly.
#[derive(Error, Debug)]
pub enum TrimlyError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (duplicate entry, overlapping booking)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business rule violation
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ============ Authentication/Authorization Errors ============
    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden access
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid token
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token expired
    #[error("Token expired")]
    TokenExpired,

    /// Invalid credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    // ============ Subscription Errors ============
    /// Tenant has no paid plan, trial, or demo window left
    #[error("Subscription expired: {0}")]
    SubscriptionExpired(String),

    /// Tenant is inside a read-only demo window
    #[error("Read-only access: {0}")]
    ReadOnlyAccess(String),

    /// Plan quota reached
    #[error("Plan limit exceeded: {0}")]
    PlanLimitExceeded(String),

    // ============ OTP Errors ============
    /// OTP code did not match
    #[error("Invalid verification code")]
    OtpInvalid,

    /// OTP code expired
    #[error("Verification code expired")]
    OtpExpired,

    /// Too many wrong OTP attempts
    #[error("Too many attempts, request a new code")]
    OtpAttemptsExceeded,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    // ============ Infrastructure Errors ============
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// External service error
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrimlyError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) | Self::BusinessRule(_) => 400,
            Self::Conflict(_) => 409,
            Self::Unauthorized(_)
            | Self::InvalidToken(_)
            | Self::TokenExpired
            | Self::InvalidCredentials
            | Self::OtpInvalid => 401,
            Self::Forbidden(_)
            | Self::SubscriptionExpired(_)
            | Self::ReadOnlyAccess(_)
            | Self::PlanLimitExceeded(_) => 403,
            Self::OtpExpired => 410,
            Self::RateLimitExceeded | Self::OtpAttemptsExceeded => 429,
            Self::ExternalService { .. } => 502,
            Self::Database(_) | Self::Configuration(_) | Self::Internal(_) | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::SubscriptionExpired(_) => "SUBSCRIPTION_EXPIRED",
            Self::ReadOnlyAccess(_) => "READ_ONLY_ACCESS",
            Self::PlanLimitExceeded(_) => "PLAN_LIMIT_EXCEEDED",
            Self::OtpInvalid => "OTP_INVALID",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpAttemptsExceeded => "OTP_ATTEMPTS_EXCEEDED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a business rule violation.
    #[must_use]
    pub fn business_rule<T: Into<String>>(message: T) -> Self {
        Self::BusinessRule(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is worth retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::ExternalService { .. })
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for TrimlyError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                match db_err.code().as_deref() {
                    // unique_violation
                    Some("23505") => Self::Conflict(db_err.message().to_string()),
                    // foreign_key_violation
                    Some("23503") => Self::Validation(db_err.message().to_string()),
                    // numeric_value_out_of_range
                    Some("22003") => Self::Validation("Value out of range".to_string()),
                    // exclusion_violation
                    Some("23P01") => Self::Conflict(match db_err.constraint() {
                        Some("appointments_staff_no_overlap") => {
                            "Staff member is already booked for that time".to_string()
                        }
                        _ => db_err.message().to_string(),
                    }),
                    _ => Self::Database(err.to_string()),
                }
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for TrimlyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `TrimlyError`.
    #[must_use]
    pub fn from_error(error: &TrimlyError) -> Self {
        // Infrastructure details stay in the logs
        let message = match error {
            TrimlyError::Database(_) | TrimlyError::Internal(_) | TrimlyError::Other(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        Self {
            code: error.error_code().to_string(),
            message,
            details: None,
        }
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&TrimlyError> for ErrorResponse {
    fn from(error: &TrimlyError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(TrimlyError::not_found("Salon", 1).status_code(), 404);
        assert_eq!(TrimlyError::validation("bad phone").status_code(), 400);
        assert_eq!(TrimlyError::business_rule("salon closed").status_code(), 400);
        assert_eq!(TrimlyError::unauthorized("not logged in").status_code(), 401);
        assert_eq!(TrimlyError::forbidden("other tenant").status_code(), 403);
        assert_eq!(TrimlyError::conflict("slot taken").status_code(), 409);
        assert_eq!(TrimlyError::RateLimitExceeded.status_code(), 429);
    }

    #[test]
    fn test_subscription_and_otp_status_codes() {
        assert_eq!(TrimlyError::SubscriptionExpired("trial ended".into()).status_code(), 403);
        assert_eq!(TrimlyError::ReadOnlyAccess("demo".into()).status_code(), 403);
        assert_eq!(TrimlyError::PlanLimitExceeded("salons".into()).status_code(), 403);
        assert_eq!(TrimlyError::OtpInvalid.status_code(), 401);
        assert_eq!(TrimlyError::OtpExpired.status_code(), 410);
        assert_eq!(TrimlyError::OtpAttemptsExceeded.status_code(), 429);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TrimlyError::not_found("Staff", 1).error_code(), "NOT_FOUND");
        assert_eq!(TrimlyError::TokenExpired.error_code(), "TOKEN_EXPIRED");
        assert_eq!(
            TrimlyError::SubscriptionExpired(String::new()).error_code(),
            "SUBSCRIPTION_EXPIRED"
        );
        assert_eq!(TrimlyError::internal("boom").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_retriable_errors() {
        assert!(TrimlyError::Database("connection lost".to_string()).is_retriable());
        assert!(!TrimlyError::not_found("Salon", 1).is_retriable());
        assert!(!TrimlyError::conflict("dup").is_retriable());
    }

    #[test]
    fn test_error_response_hides_internal_details() {
        let err = TrimlyError::Database("password=secret host=db".to_string());
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "DATABASE_ERROR");
        assert!(!response.message.contains("secret"));
    }

    #[test]
    fn test_error_response_with_details() {
        let err = TrimlyError::validation("bad input");
        let details = vec![FieldError {
            field: "phone".to_string(),
            message: "Invalid phone number".to_string(),
            code: "phone".to_string(),
        }];
        let response = ErrorResponse::from_error(&err).with_details(details);
        assert_eq!(response.details.map(|d| d.len()), Some(1));
        assert!(response.message.contains("bad input"));
    }
}
