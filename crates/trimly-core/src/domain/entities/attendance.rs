//! Daily staff attendance.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::AttendanceStatus;
use crate::{AttendanceId, SalonId, StaffId};

/// One attendance record per staff member per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub salon_id: SalonId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    #[must_use]
    pub fn new(
        salon_id: SalonId,
        staff_id: StaffId,
        date: NaiveDate,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttendanceId::new(),
            salon_id,
            staff_id,
            date,
            status,
            check_in: None,
            check_out: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Minutes between check-in and check-out, zero while still checked in.
    #[must_use]
    pub fn worked_minutes(&self) -> i64 {
        match (self.check_in, self.check_out) {
            (Some(start), Some(end)) if end > start => (end - start).num_minutes(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_minutes() {
        let mut record = Attendance::new(
            SalonId::new(),
            StaffId::new(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            AttendanceStatus::Present,
            Utc::now(),
        );
        assert_eq!(record.worked_minutes(), 0);
        record.check_in = NaiveTime::from_hms_opt(9, 5, 0);
        assert_eq!(record.worked_minutes(), 0);
        record.check_out = NaiveTime::from_hms_opt(17, 35, 0);
        assert_eq!(record.worked_minutes(), 510);
    }
}
