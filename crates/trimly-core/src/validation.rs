//! Validation utilities.

use crate::{FieldError, TrimlyError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `TrimlyError` on failure.
    fn validate_request(&self) -> Result<(), TrimlyError> {
        self.validate().map_err(validation_errors_to_trimly_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator::ValidationErrors` into field errors.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), |m| m.to_string()),
                code: error.code.to_string(),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Converts `validator::ValidationErrors` to `TrimlyError`.
#[must_use]
pub fn validation_errors_to_trimly_error(errors: ValidationErrors) -> TrimlyError {
    let message = field_errors(&errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    TrimlyError::Validation(message)
}

/// Normalises a phone number to `+` followed by digits.
///
/// Spaces, dashes, dots and parentheses are dropped. A number must carry
/// 8 to 15 digits.
pub fn normalize_phone(raw: &str) -> Result<String, TrimlyError> {
    let trimmed = raw.trim();
    let mut digits = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            '+' if i == 0 => {}
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(TrimlyError::validation(format!("Invalid phone number: {raw}"))),
        }
    }
    if !(8..=15).contains(&digits.len()) {
        return Err(TrimlyError::validation(format!("Invalid phone number: {raw}")));
    }
    Ok(format!("+{digits}"))
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates that a password meets complexity requirements.
    pub fn password_complexity(password: &str) -> Result<(), ValidationError> {
        if password.len() < 8 {
            return Err(ValidationError::new("password_too_short"));
        }

        let has_letter = password.chars().any(char::is_alphabetic);
        let has_digit = password.chars().any(|c| c.is_ascii_digit());

        if !has_letter {
            return Err(ValidationError::new("password_missing_letter"));
        }
        if !has_digit {
            return Err(ValidationError::new("password_missing_digit"));
        }

        Ok(())
    }

    /// Validates that a phone number can be normalised.
    pub fn phone_number(value: &str) -> Result<(), ValidationError> {
        super::normalize_phone(value)
            .map(|_| ())
            .map_err(|_| ValidationError::new("phone_invalid"))
    }

    /// Validates an OTP code: digits only, 4 to 8 of them.
    pub fn otp_code(value: &str) -> Result<(), ValidationError> {
        if !(4..=8).contains(&value.len()) || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new("otp_code_invalid"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_password_complexity() {
        assert!(password_complexity("secret123").is_ok());
        assert!(password_complexity("short1").is_err());
        assert!(password_complexity("12345678").is_err());
        assert!(password_complexity("lettersonly").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("(555) 123.4567").unwrap(), "+5551234567");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("98765abc43210").is_err());
        assert!(normalize_phone("98+76543210").is_err());
    }

    #[test]
    fn test_otp_code_rule() {
        assert!(otp_code("123456").is_ok());
        assert!(otp_code("12a456").is_err());
        assert!(otp_code("12").is_err());
    }

    #[test]
    fn test_validation_error_message_lists_fields() {
        use validator::Validate;

        #[derive(Validate)]
        struct Contact {
            #[validate(length(min = 3, message = "too short"))]
            name: String,
            #[validate(custom(function = "phone_number"))]
            phone: String,
        }

        let contact = Contact {
            name: "a".into(),
            phone: "x".into(),
        };
        let err = contact.validate_request().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("name: too short"));
        assert!(message.contains("phone: phone_invalid"));
    }
}
