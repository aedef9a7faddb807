//! # Trimly Security
//!
//! JWT authentication, password and passcode hashing, role and tenant
//! authorization, and keyed rate limiting.

pub mod jwt;
pub mod otp;
pub mod password;
pub mod rate_limit;
pub mod rbac;

pub use jwt::*;
pub use otp::*;
pub use password::*;
pub use rate_limit::*;
pub use rbac::*;
