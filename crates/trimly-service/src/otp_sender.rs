//! Delivery of one-time passcodes.

use async_trait::async_trait;
use tracing::{debug, info};
use trimly_core::{Interface, TrimlyResult};

/// Delivers a passcode to a phone number.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpSender: Interface + Send + Sync {
    async fn send(&self, phone: &str, code: &str) -> TrimlyResult<()>;
}

/// Sender that writes codes to the log instead of an SMS gateway.
///
/// The code itself is only emitted at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOtpSender;

#[async_trait]
impl OtpSender for LoggingOtpSender {
    async fn send(&self, phone: &str, code: &str) -> TrimlyResult<()> {
        info!("Passcode issued to {}", mask_phone(phone));
        debug!("Passcode for {}: {}", phone, code);
        Ok(())
    }
}

/// Keeps the last four digits of a phone number.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let visible = phone.len().saturating_sub(4);
    phone
        .char_indices()
        .map(|(i, c)| if i < visible && c.is_ascii_digit() { '*' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+919800000123"), "+********0123");
        assert_eq!(mask_phone("123"), "123");
    }

    #[tokio::test]
    async fn test_logging_sender_accepts() {
        assert!(LoggingOtpSender.send("+919800000123", "123456").await.is_ok());
    }
}
