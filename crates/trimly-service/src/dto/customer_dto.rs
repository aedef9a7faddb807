//! Customer self-service DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trimly_core::rules::{not_blank, otp_code, phone_number};
use trimly_core::{Customer, CustomerId};
use validator::Validate;

/// Ask for a passcode to be sent to a phone.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(custom(function = "phone_number"))]
    pub phone: String,
}

/// A passcode was issued. The code itself is only sent to the phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRequestedResponse {
    pub phone: String,
    pub expires_in: i64,
}

/// Exchange a passcode for tokens. `name` and `email` are kept on sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(custom(function = "phone_number"))]
    pub phone: String,

    #[validate(custom(function = "otp_code"))]
    pub code: String,

    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            last_login_at: customer.last_login_at,
            created_at: customer.created_at,
        }
    }
}

/// Tokens issued to a customer after a successful verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// True when this verification created the account.
    pub is_new_customer: bool,
    pub customer: CustomerResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_validation() {
        let request = VerifyOtpRequest {
            phone: "+919800000002".to_string(),
            code: "123456".to_string(),
            name: None,
            email: None,
        };
        assert!(request.validate().is_ok());

        let bad = VerifyOtpRequest {
            code: "12ab".to_string(),
            email: Some("nope".to_string()),
            ..request
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
        assert!(errors.field_errors().contains_key("email"));
    }
}
