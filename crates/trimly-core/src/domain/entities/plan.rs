//! Subscription plan entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PlanId, PlanLimits};

/// A purchasable subscription plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_days: i32,
    pub max_salons: i32,
    pub max_staff_per_salon: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Creates an active plan.
    #[must_use]
    pub fn new(
        name: String,
        description: Option<String>,
        price: Decimal,
        duration_days: i32,
        max_salons: i32,
        max_staff_per_salon: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PlanId::new(),
            name,
            description,
            price,
            duration_days,
            max_salons,
            max_staff_per_salon,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quotas granted while this plan is active.
    #[must_use]
    pub fn limits(&self) -> PlanLimits {
        PlanLimits {
            max_salons: u32::try_from(self.max_salons).unwrap_or(0),
            max_staff_per_salon: u32::try_from(self.max_staff_per_salon).unwrap_or(0),
        }
    }
}
