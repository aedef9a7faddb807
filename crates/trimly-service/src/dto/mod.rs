//! Data Transfer Objects (DTOs) for the service layer.

mod appointment_dto;
mod auth_dto;
mod catalog_dto;
mod customer_dto;
mod finance_dto;
mod plan_dto;
mod salon_dto;
mod staff_dto;
mod user_dto;

pub use appointment_dto::*;
pub use auth_dto::*;
pub use catalog_dto::*;
pub use customer_dto::*;
pub use finance_dto::*;
pub use plan_dto::*;
pub use salon_dto::*;
pub use staff_dto::*;
pub use user_dto::*;
