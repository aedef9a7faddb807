//! REST API controllers.

pub mod appointment_controller;
pub mod attendance_controller;
pub mod auth_controller;
pub mod catalog_controller;
pub mod customer_controller;
pub mod expense_controller;
pub mod health_controller;
pub mod inventory_controller;
pub mod plan_controller;
pub mod salon_controller;
pub mod staff_controller;
pub mod subscription_controller;
pub mod user_controller;

pub use health_controller::*;

use crate::responses::AppError;
use std::str::FromStr;
use trimly_core::TrimlyError;

/// Parses a typed id from a path segment.
pub(crate) fn parse_id<T: FromStr>(kind: &str, raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError(TrimlyError::validation(format!("Invalid {kind} id: {raw}"))))
}
