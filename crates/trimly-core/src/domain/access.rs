//! Tenant access windows and the limits they grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PlanId;

/// Which window a tenant is in at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "window", rename_all = "snake_case")]
pub enum AccessWindow {
    /// A paid plan is active.
    Paid {
        plan_id: PlanId,
        expires_at: DateTime<Utc>,
    },
    /// Free trial with trial limits.
    Trial { ends_at: DateTime<Utc> },
    /// Read-only demo.
    Demo { ends_at: DateTime<Utc> },
    /// Nothing open.
    Expired,
}

impl AccessWindow {
    /// Level of access the window grants.
    #[must_use]
    pub const fn level(&self) -> AccessLevel {
        match self {
            Self::Paid { .. } | Self::Trial { .. } => AccessLevel::Full,
            Self::Demo { .. } => AccessLevel::ReadOnly,
            Self::Expired => AccessLevel::None,
        }
    }

    /// When the window closes.
    #[must_use]
    pub const fn ends_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Paid { expires_at, .. } => Some(*expires_at),
            Self::Trial { ends_at } | Self::Demo { ends_at } => Some(*ends_at),
            Self::Expired => None,
        }
    }

    /// Short name for logs and responses.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Paid { .. } => "paid",
            Self::Trial { .. } => "trial",
            Self::Demo { .. } => "demo",
            Self::Expired => "expired",
        }
    }
}

/// What a request may do under a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Full,
    ReadOnly,
    None,
}

/// Quotas enforced when creating salons and staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_salons: u32,
    pub max_staff_per_salon: u32,
}
