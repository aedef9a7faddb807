//! Staff roster entity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::WeekdaySet;
use crate::{SalonId, ServiceId, StaffId, UserId};

/// A member of a salon's roster. May be linked to a login account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub salon_id: SalonId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub designation: Option<String>,
    pub weekly_off: WeekdaySet,
    pub is_active: bool,
    pub joined_on: Option<NaiveDate>,
    /// Services this staff member performs; mirrors `SalonService::staff_ids`.
    pub service_ids: Vec<ServiceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    /// Creates an active staff member with no services assigned.
    #[must_use]
    pub fn new(salon_id: SalonId, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: StaffId::new(),
            salon_id,
            user_id: None,
            name,
            phone: None,
            email: None,
            designation: None,
            weekly_off: WeekdaySet::EMPTY,
            is_active: true,
            joined_on: None,
            service_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether `date` is this staff member's weekly off.
    #[must_use]
    pub fn is_off_on(&self, date: NaiveDate) -> bool {
        self.weekly_off.contains_date(date)
    }

    /// Checks whether every requested service is assigned.
    #[must_use]
    pub fn performs_all(&self, services: &[ServiceId]) -> bool {
        services.iter().all(|s| self.service_ids.contains(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn test_performs_all() {
        let mut staff = Staff::new(SalonId::new(), "Ravi".into(), Utc::now());
        let cut = ServiceId::new();
        let shave = ServiceId::new();
        staff.service_ids = vec![cut];
        assert!(staff.performs_all(&[cut]));
        assert!(!staff.performs_all(&[cut, shave]));
        assert!(staff.performs_all(&[]));
    }

    #[test]
    fn test_weekly_off() {
        let mut staff = Staff::new(SalonId::new(), "Ravi".into(), Utc::now());
        staff.weekly_off = [Weekday::Tue].into_iter().collect();
        let tuesday = NaiveDate::from_isoywd_opt(2025, 20, Weekday::Tue).unwrap();
        assert!(staff.is_off_on(tuesday));
        assert!(!staff.is_off_on(tuesday.succ_opt().unwrap()));
    }
}
