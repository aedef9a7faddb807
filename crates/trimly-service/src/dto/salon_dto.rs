//! Salon DTOs.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use trimly_core::rules::{not_blank, phone_number};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSalonRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: String,

    #[validate(length(max = 300))]
    pub address: Option<String>,

    #[validate(custom(function = "phone_number"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,

    /// Defaults to Monday through Saturday.
    pub working_days: Option<Vec<Weekday>>,

    /// Defaults to the configured booking interval.
    pub slot_interval_minutes: Option<i32>,

    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Every field is optional; schedule changes are validated together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSalonRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 300))]
    pub address: Option<String>,

    #[validate(custom(function = "phone_number"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    pub working_days: Option<Vec<Weekday>>,
    pub slot_interval_minutes: Option<i32>,
    pub utc_offset_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HolidaysRequest {
    #[validate(length(min = 1, max = 366))]
    pub dates: Vec<NaiveDate>,
}
