//! Self-service customers and their pending OTP challenges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CustomerId;

/// A customer identified by a normalised phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Creates a customer on first successful verification.
    #[must_use]
    pub fn new(phone: String, name: Option<String>, email: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: CustomerId::new(),
            name,
            phone,
            email,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Records a successful login.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

/// An outstanding one-time passcode for a phone number.
///
/// Only the Argon2 hash of the code is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub phone: String,
    #[serde(skip_serializing)]
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    #[must_use]
    pub const fn new(phone: String, code_hash: String, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            phone,
            code_hash,
            attempts: 0,
            expires_at,
            created_at: now,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub const fn attempts_exhausted(&self, max_attempts: i32) -> bool {
        self.attempts >= max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_challenge_expiry_and_attempts() {
        let now = Utc::now();
        let mut challenge = OtpChallenge::new("+15550001111".into(), "h".into(), now + Duration::seconds(300), now);
        assert!(!challenge.is_expired(now));
        assert!(challenge.is_expired(now + Duration::seconds(300)));

        assert!(!challenge.attempts_exhausted(3));
        challenge.attempts = 3;
        assert!(challenge.attempts_exhausted(3));
    }
}
