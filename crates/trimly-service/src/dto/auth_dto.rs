//! Authentication-related DTOs.

use crate::dto::UserResponse;
use serde::{Deserialize, Serialize};
use trimly_core::rules::{not_blank, password_complexity, phone_number};
use validator::Validate;

/// Tenant sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterAdminRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(custom(function = "password_complexity"))]
    pub password: String,

    #[validate(custom(function = "phone_number"))]
    pub phone: Option<String>,
}

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Password change for the signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(custom(function = "password_complexity"))]
    pub new_password: String,
}

/// Authentication response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_valid() {
        let request = RegisterAdminRequest {
            name: "Asha Rao".to_string(),
            email: "asha@glow.example".to_string(),
            password: "Password123".to_string(),
            phone: Some("+91 98000 00001".to_string()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_weak_password_and_bad_phone() {
        let request = RegisterAdminRequest {
            name: "Asha".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            phone: Some("call me".to_string()),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("phone"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let request = RegisterAdminRequest {
            name: "   ".to_string(),
            email: "asha@glow.example".to_string(),
            password: "Password123".to_string(),
            phone: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_request_requires_both_fields() {
        let request = LoginRequest {
            email: String::new(),
            password: String::new(),
        };
        assert_eq!(request.validate().unwrap_err().field_errors().len(), 2);
    }
}
