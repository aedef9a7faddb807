//! RBAC permission checker and tenant scoping.

use crate::Claims;
use trimly_core::{CustomerId, Permission, Salon, SalonId, TenantId, TrimlyError, TrimlyResult, UserId, UserRole};

/// Extension trait for Claims to check roles, permissions, and scope.
pub trait ClaimsExt {
    /// Requires a specific role.
    fn require_role(&self, role: UserRole) -> TrimlyResult<()>;

    /// Requires a specific permission.
    fn require_permission(&self, permission: Permission) -> TrimlyResult<()>;

    /// Requires the user to be a super admin.
    fn require_super_admin(&self) -> TrimlyResult<()>;

    /// Requires a staff-side account and returns its id.
    fn require_user(&self) -> TrimlyResult<UserId>;

    /// Requires a customer token and returns the customer id.
    fn require_customer(&self) -> TrimlyResult<CustomerId>;

    /// Requires a tenant-bound principal and returns the tenant.
    fn require_tenant(&self) -> TrimlyResult<TenantId>;

    /// Checks whether the principal may act on `salon`.
    fn can_access_salon(&self, salon: &Salon) -> bool;

    /// Requires access to `salon`.
    fn require_salon_access(&self, salon: &Salon) -> TrimlyResult<()>;

    /// Checks whether the principal may act on resources of `tenant`.
    fn can_access_tenant(&self, tenant: TenantId) -> bool;
}

impl ClaimsExt for Claims {
    fn require_role(&self, role: UserRole) -> TrimlyResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(TrimlyError::Forbidden(format!(
                "Required role: {}, your role: {}",
                role, self.role
            )))
        }
    }

    fn require_permission(&self, permission: Permission) -> TrimlyResult<()> {
        if permission.is_allowed_for(self.role) {
            Ok(())
        } else {
            Err(TrimlyError::Forbidden(format!(
                "Permission denied: {} requires at least {} role",
                permission,
                permission.minimum_role()
            )))
        }
    }

    fn require_super_admin(&self) -> TrimlyResult<()> {
        self.require_role(UserRole::SuperAdmin)
    }

    fn require_user(&self) -> TrimlyResult<UserId> {
        self.user_id()
            .ok_or_else(|| TrimlyError::forbidden("Staff account required"))
    }

    fn require_customer(&self) -> TrimlyResult<CustomerId> {
        self.customer_id()
            .ok_or_else(|| TrimlyError::forbidden("Customer account required"))
    }

    fn require_tenant(&self) -> TrimlyResult<TenantId> {
        self.tenant_id()
            .ok_or_else(|| TrimlyError::forbidden("Tenant account required"))
    }

    fn can_access_salon(&self, salon: &Salon) -> bool {
        match self.role {
            UserRole::SuperAdmin => true,
            UserRole::Admin => self.tenant_id() == Some(salon.owner_id),
            UserRole::Manager | UserRole::Staff => {
                self.salon_id() == Some(salon.id) && self.tenant_id() == Some(salon.owner_id)
            }
            UserRole::Customer => false,
        }
    }

    fn require_salon_access(&self, salon: &Salon) -> TrimlyResult<()> {
        if self.can_access_salon(salon) {
            Ok(())
        } else {
            Err(TrimlyError::forbidden(format!(
                "No access to salon {}",
                salon.id
            )))
        }
    }

    fn can_access_tenant(&self, tenant: TenantId) -> bool {
        self.is_super_admin() || self.tenant_id() == Some(tenant)
    }
}

/// Salon a salon-scoped principal is pinned to, if any.
#[must_use]
pub fn pinned_salon(claims: &Claims) -> Option<SalonId> {
    if claims.role.is_salon_scoped() {
        claims.salon_id()
    } else {
        None
    }
}
