//! Appointment entity.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AppointmentKind, AppointmentStatus, TimeSlot};
use crate::{AppointmentId, CustomerId, SalonId, ServiceId, StaffId, TrimlyError, TrimlyResult, UserId};

/// A booking of one staff member for one or more services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub salon_id: SalonId,
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub staff_id: StaffId,
    pub service_ids: Vec<ServiceId>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: AppointmentKind,
    pub status: AppointmentStatus,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who the appointment is for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomerDetails {
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub phone: Option<String>,
}

impl Appointment {
    /// Creates an appointment for an already validated slot.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        salon_id: SalonId,
        staff_id: StaffId,
        service_ids: Vec<ServiceId>,
        date: NaiveDate,
        slot: TimeSlot,
        total_price: Decimal,
        customer: CustomerDetails,
        kind: AppointmentKind,
        now: DateTime<Utc>,
    ) -> Self {
        let status = match kind {
            AppointmentKind::Scheduled => AppointmentStatus::Booked,
            AppointmentKind::WalkIn => AppointmentStatus::Confirmed,
        };
        Self {
            id: AppointmentId::new(),
            salon_id,
            customer_id: customer.customer_id,
            customer_name: customer.name,
            customer_phone: customer.phone,
            staff_id,
            service_ids,
            date,
            start_time: slot.start,
            end_time: slot.end,
            kind,
            status,
            total_price,
            notes: None,
            cancellation_reason: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The booked interval.
    #[must_use]
    pub const fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Moves to `next` if the lifecycle allows it.
    pub fn transition(&mut self, next: AppointmentStatus, now: DateTime<Utc>) -> TrimlyResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(TrimlyError::business_rule(format!(
                "Cannot change appointment status from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Cancels the appointment, keeping the reason.
    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> TrimlyResult<()> {
        self.transition(AppointmentStatus::Cancelled, now)?;
        self.cancellation_reason = reason;
        Ok(())
    }

    /// Moves the appointment to a new validated slot.
    pub fn reschedule(&mut self, staff_id: StaffId, date: NaiveDate, slot: TimeSlot, now: DateTime<Utc>) {
        self.staff_id = staff_id;
        self.date = date;
        self.start_time = slot.start;
        self.end_time = slot.end;
        self.updated_at = now;
    }
}
