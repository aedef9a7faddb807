//! Category and service DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trimly_core::rules::not_blank;
use trimly_core::{CategoryId, StaffId};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 80), custom(function = "not_blank"))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 80), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub category_id: Option<CategoryId>,

    #[validate(range(min = 5, max = 600))]
    pub duration_minutes: i32,

    pub price: Decimal,

    #[serde(default)]
    pub staff_ids: Vec<StaffId>,
}

/// `category_id: Some(None)` is not expressible in JSON, so moving a service
/// out of its category uses `clear_category`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub category_id: Option<CategoryId>,

    #[serde(default)]
    pub clear_category: bool,

    #[validate(range(min = 5, max = 600))]
    pub duration_minutes: Option<i32>,

    pub price: Option<Decimal>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ServiceQuery {
    pub category_id: Option<CategoryId>,
    pub active: Option<bool>,
}

/// Replaces the staff who perform a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStaffRequest {
    pub staff_ids: Vec<StaffId>,
}
