//! User role value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TrimlyError;

/// Principal roles with hierarchical permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Self-service customer authenticated by OTP.
    Customer,
    /// Salon employee.
    Staff,
    /// Salon manager.
    Manager,
    /// Tenant owner.
    Admin,
    /// Platform operator.
    SuperAdmin,
}

impl UserRole {
    /// Returns the role's permission level (higher = more permissions).
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::Customer => 0,
            Self::Staff => 1,
            Self::Manager => 2,
            Self::Admin => 3,
            Self::SuperAdmin => 4,
        }
    }

    /// Checks if this role has at least the permissions of the required role.
    #[must_use]
    pub const fn has_permission(&self, required: Self) -> bool {
        self.level() >= required.level()
    }

    /// Roles that are scoped to a single salon.
    #[must_use]
    pub const fn is_salon_scoped(&self) -> bool {
        matches!(self, Self::Staff | Self::Manager)
    }

    /// Roles an admin or manager may assign to employee accounts.
    #[must_use]
    pub const fn is_employee(&self) -> bool {
        self.is_salon_scoped()
    }

    /// Returns the role as its wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = TrimlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "staff" => Ok(Self::Staff),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            "super_admin" | "superadmin" => Ok(Self::SuperAdmin),
            other => Err(TrimlyError::validation(format!("Unknown role: {other}"))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission types for RBAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Salon permissions
    SalonRead,
    SalonManage,

    // Back-office permissions
    StaffManage,
    CatalogManage,
    AttendanceMark,
    InventoryManage,
    ExpenseManage,
    UserManage,

    // Front-desk permissions
    AppointmentManage,
    AttendanceSelf,

    // Tenant permissions
    SubscriptionManage,

    // Platform permissions
    PlanManage,
    TenantAccessGrant,
}

impl Permission {
    /// Returns the minimum role required for this permission.
    #[must_use]
    pub const fn minimum_role(&self) -> UserRole {
        match self {
            Self::SalonRead | Self::AppointmentManage | Self::AttendanceSelf => UserRole::Staff,

            Self::StaffManage
            | Self::CatalogManage
            | Self::AttendanceMark
            | Self::InventoryManage
            | Self::ExpenseManage
            | Self::UserManage => UserRole::Manager,

            Self::SalonManage | Self::SubscriptionManage => UserRole::Admin,

            Self::PlanManage | Self::TenantAccessGrant => UserRole::SuperAdmin,
        }
    }

    /// Checks if the given role has this permission.
    #[must_use]
    pub const fn is_allowed_for(&self, role: UserRole) -> bool {
        role.has_permission(self.minimum_role())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SalonRead => "salon:read",
            Self::SalonManage => "salon:manage",
            Self::StaffManage => "staff:manage",
            Self::CatalogManage => "catalog:manage",
            Self::AttendanceMark => "attendance:mark",
            Self::InventoryManage => "inventory:manage",
            Self::ExpenseManage => "expense:manage",
            Self::UserManage => "user:manage",
            Self::AppointmentManage => "appointment:manage",
            Self::AttendanceSelf => "attendance:self",
            Self::SubscriptionManage => "subscription:manage",
            Self::PlanManage => "plan:manage",
            Self::TenantAccessGrant => "tenant:grant_access",
        };
        f.write_str(name)
    }
}
