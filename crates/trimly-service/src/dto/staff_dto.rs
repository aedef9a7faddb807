//! Staff roster DTOs.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use trimly_core::rules::{not_blank, phone_number};
use trimly_core::{ServiceId, UserId};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: String,

    #[validate(custom(function = "phone_number"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 80))]
    pub designation: Option<String>,

    #[serde(default)]
    pub weekly_off: Vec<Weekday>,

    pub joined_on: Option<NaiveDate>,

    /// Login account of the same salon to link.
    pub user_id: Option<UserId>,

    #[serde(default)]
    pub service_ids: Vec<ServiceId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(custom(function = "phone_number"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 80))]
    pub designation: Option<String>,

    pub weekly_off: Option<Vec<Weekday>>,
    pub joined_on: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StaffQuery {
    pub active: Option<bool>,
}

/// Replaces the services a staff member performs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignServicesRequest {
    pub service_ids: Vec<ServiceId>,
}
