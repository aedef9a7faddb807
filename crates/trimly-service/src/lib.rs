//! # Trimly Service
//!
//! Business logic for the salon backend: accounts and tenancy, subscription
//! gating, salon back office, and the booking engine.
//! Contains use cases and application services.

pub mod access_service;
pub mod appointment_service;
pub mod attendance_service;
pub mod auth_service;
pub mod cache;
pub mod catalog_service;
pub mod customer_service;
pub mod dto;
pub mod expense_service;
pub mod inventory_service;
pub mod otp_sender;
pub mod plan_service;
pub mod registry;
pub mod salon_service;
pub mod scheduling;
pub mod staff_service;
pub mod subscription_service;
pub mod user_service;

mod scope;

#[cfg(test)]
mod test_support;

pub use access_service::*;
pub use appointment_service::*;
pub use attendance_service::*;
pub use auth_service::*;
pub use cache::*;
pub use catalog_service::*;
pub use customer_service::*;
pub use dto::*;
pub use expense_service::*;
pub use inventory_service::*;
pub use otp_sender::*;
pub use plan_service::*;
pub use registry::Services;
pub use salon_service::*;
pub use scheduling::{AvailableSlot, ServiceBundle, StaffDay};
pub use staff_service::*;
pub use subscription_service::*;
pub use user_service::*;
