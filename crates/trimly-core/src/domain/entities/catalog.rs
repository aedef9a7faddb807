//! Service catalog: categories and bookable services.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CategoryId, SalonId, ServiceId, StaffId};

/// Allowed service durations, in minutes.
pub const SERVICE_DURATION_RANGE: std::ops::RangeInclusive<i32> = 5..=600;

/// Grouping of services within a salon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub salon_id: SalonId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    #[must_use]
    pub fn new(salon_id: SalonId, name: String, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: CategoryId::new(),
            salon_id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A bookable service such as a haircut or facial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalonService {
    pub id: ServiceId,
    pub salon_id: SalonId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub is_active: bool,
    /// Staff who perform this service; mirrors `Staff::service_ids`.
    pub staff_ids: Vec<StaffId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalonService {
    #[must_use]
    pub fn new(
        salon_id: SalonId,
        category_id: Option<CategoryId>,
        name: String,
        duration_minutes: i32,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ServiceId::new(),
            salon_id,
            category_id,
            name,
            description: None,
            duration_minutes,
            price,
            is_active: true,
            staff_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
