//! Plan and subscription DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trimly_core::rules::not_blank;
use trimly_core::{AccessLevel, AccessWindow, Plan, PlanId, PlanLimits, TenantId};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 80), custom(function = "not_blank"))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub price: Decimal,

    #[validate(range(min = 1, max = 3660))]
    pub duration_days: i32,

    #[validate(range(min = 1))]
    pub max_salons: i32,

    #[validate(range(min = 1))]
    pub max_staff_per_salon: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 80), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub price: Option<Decimal>,

    #[validate(range(min = 1, max = 3660))]
    pub duration_days: Option<i32>,

    #[validate(range(min = 1))]
    pub max_salons: Option<i32>,

    #[validate(range(min = 1))]
    pub max_staff_per_salon: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: PlanId,
}

/// Opens a demo window or extends a trial. Exactly one must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GrantAccessRequest {
    #[validate(range(min = 1, max = 365))]
    pub demo_days: Option<i64>,

    #[validate(range(min = 1, max = 365))]
    pub trial_days: Option<i64>,
}

/// Where a tenant stands right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatusResponse {
    pub tenant_id: TenantId,
    pub window: AccessWindow,
    pub access: AccessLevel,
    pub expires_at: Option<DateTime<Utc>>,
    pub plan: Option<Plan>,
    pub limits: PlanLimits,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub demo_ends_at: Option<DateTime<Utc>>,
}
