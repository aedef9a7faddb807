//! Email value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidateEmail;

use crate::TrimlyError;

/// Lower-cased, validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Creates a new Email after validating the format.
    pub fn new(email: impl Into<String>) -> Result<Self, TrimlyError> {
        let email = email.into().trim().to_lowercase();

        if !email.validate_email() {
            return Err(TrimlyError::validation(format!("Invalid email address: {email}")));
        }

        Ok(Self(email))
    }

    /// Wraps an address read back from storage.
    #[must_use]
    pub fn new_unchecked(email: impl Into<String>) -> Self {
        Self(email.into().trim().to_lowercase())
    }

    /// Returns the email as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = TrimlyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalization() {
        let email = Email::new("  Owner@Salon.Example  ").unwrap();
        assert_eq!(email.as_str(), "owner@salon.example");
    }

    #[test]
    fn test_invalid_email() {
        assert!(Email::new("invalid").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("test@").is_err());
    }

    #[test]
    fn test_email_deserialize_validates() {
        assert!(serde_json::from_str::<Email>("\"a@b.co\"").is_ok());
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
