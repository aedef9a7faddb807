//! Appointment DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use trimly_core::rules::{not_blank, phone_number};
use trimly_core::{AppointmentStatus, CustomerId, SalonId, ServiceId, StaffId};
use validator::Validate;

/// Front-desk booking of a specific staff member and time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookAppointmentRequest {
    pub staff_id: StaffId,
    pub service_ids: Vec<ServiceId>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,

    /// Links the booking to a registered customer.
    pub customer_id: Option<CustomerId>,

    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub customer_name: String,

    #[validate(custom(function = "phone_number"))]
    pub customer_phone: Option<String>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Walk-in: the earliest free slot from now is allocated.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WalkInRequest {
    pub service_ids: Vec<ServiceId>,

    /// Restricts allocation to this staff member.
    pub staff_id: Option<StaffId>,

    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub customer_name: Option<String>,

    #[validate(custom(function = "phone_number"))]
    pub customer_phone: Option<String>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Booking made by a signed-in customer for themselves.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerBookingRequest {
    pub salon_id: SalonId,
    pub staff_id: StaffId,
    pub service_ids: Vec<ServiceId>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub service_ids: Vec<ServiceId>,
    pub staff_id: Option<StaffId>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AppointmentQuery {
    pub date: Option<NaiveDate>,
    pub staff_id: Option<StaffId>,
    pub status: Option<AppointmentStatus>,
}

/// Moves a booking. The staff member stays the same unless given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub staff_id: Option<StaffId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelAppointmentRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}
