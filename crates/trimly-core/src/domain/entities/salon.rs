//! Salon (branch) entity.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::WeekdaySet;
use crate::{SalonId, TenantId, TrimlyError, TrimlyResult};

/// Smallest and largest booking grid step, in minutes.
pub const SLOT_INTERVAL_RANGE: std::ops::RangeInclusive<i32> = 5..=120;
/// Allowed UTC offsets, in minutes.
pub const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -720..=840;

/// A salon branch owned by a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salon {
    pub id: SalonId,
    pub owner_id: TenantId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub working_days: WeekdaySet,
    /// Sorted, without duplicates.
    pub holidays: Vec<NaiveDate>,
    pub slot_interval_minutes: i32,
    pub utc_offset_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Opening hours and calendar settings, shared by create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalonSchedule {
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub working_days: WeekdaySet,
    pub slot_interval_minutes: i32,
    pub utc_offset_minutes: i32,
}

impl SalonSchedule {
    /// Checks the schedule invariants.
    pub fn validate(&self) -> TrimlyResult<()> {
        if self.opening_time >= self.closing_time {
            return Err(TrimlyError::validation(
                "opening_time must be before closing_time",
            ));
        }
        if self.working_days.is_empty() {
            return Err(TrimlyError::validation(
                "at least one working day is required",
            ));
        }
        if !SLOT_INTERVAL_RANGE.contains(&self.slot_interval_minutes) {
            return Err(TrimlyError::validation(
                "slot_interval_minutes must be between 5 and 120",
            ));
        }
        if !UTC_OFFSET_RANGE.contains(&self.utc_offset_minutes) {
            return Err(TrimlyError::validation(
                "utc_offset_minutes must be between -720 and 840",
            ));
        }
        Ok(())
    }
}

impl Salon {
    /// Creates an active salon after validating its schedule.
    pub fn new(
        owner_id: TenantId,
        name: String,
        schedule: SalonSchedule,
        now: DateTime<Utc>,
    ) -> TrimlyResult<Self> {
        schedule.validate()?;
        Ok(Self {
            id: SalonId::new(),
            owner_id,
            name,
            address: None,
            phone: None,
            email: None,
            opening_time: schedule.opening_time,
            closing_time: schedule.closing_time,
            working_days: schedule.working_days,
            holidays: Vec::new(),
            slot_interval_minutes: schedule.slot_interval_minutes,
            utc_offset_minutes: schedule.utc_offset_minutes,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Current schedule settings.
    #[must_use]
    pub const fn schedule(&self) -> SalonSchedule {
        SalonSchedule {
            opening_time: self.opening_time,
            closing_time: self.closing_time,
            working_days: self.working_days,
            slot_interval_minutes: self.slot_interval_minutes,
            utc_offset_minutes: self.utc_offset_minutes,
        }
    }

    /// Replaces the schedule after validating it.
    pub fn set_schedule(&mut self, schedule: SalonSchedule, now: DateTime<Utc>) -> TrimlyResult<()> {
        schedule.validate()?;
        self.opening_time = schedule.opening_time;
        self.closing_time = schedule.closing_time;
        self.working_days = schedule.working_days;
        self.slot_interval_minutes = schedule.slot_interval_minutes;
        self.utc_offset_minutes = schedule.utc_offset_minutes;
        self.updated_at = now;
        Ok(())
    }

    /// Checks whether the salon is closed for a holiday on `date`.
    #[must_use]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.binary_search(&date).is_ok()
    }

    /// Checks whether `date` falls on a working weekday.
    #[must_use]
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains_date(date)
    }

    /// Adds holidays, keeping the list sorted and unique.
    pub fn add_holidays(&mut self, dates: &[NaiveDate], now: DateTime<Utc>) {
        self.holidays.extend_from_slice(dates);
        self.holidays.sort_unstable();
        self.holidays.dedup();
        self.updated_at = now;
    }

    /// Removes holidays; unknown dates are ignored.
    pub fn remove_holidays(&mut self, dates: &[NaiveDate], now: DateTime<Utc>) {
        self.holidays.retain(|d| !dates.contains(d));
        self.updated_at = now;
    }

    /// Salon-local wall-clock time for a UTC instant.
    #[must_use]
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.naive_utc() + Duration::minutes(i64::from(self.utc_offset_minutes))
    }

    /// UTC instant for a salon-local wall-clock time.
    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        (local - Duration::minutes(i64::from(self.utc_offset_minutes))).and_utc()
    }
}
