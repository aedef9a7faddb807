//! Tenant access windows, request gating, and plan quotas.

use crate::cache::TtlCache;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use trimly_config::SubscriptionConfig;
use trimly_core::{
    AccessLevel, AccessWindow, Clock, Interface, PlanLimits, SalonId, TenantId, TrimlyError,
    TrimlyResult,
};
use trimly_repository::{PlanRepository, Repositories, SalonRepository, StaffRepository, UserRepository};
use trimly_security::{Claims, ClaimsExt};

/// A tenant's window and the quotas it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantAccess {
    pub window: AccessWindow,
    pub limits: PlanLimits,
}

/// Access gating service trait.
#[async_trait]
pub trait AccessService: Interface + Send + Sync {
    /// Current window and limits of `tenant`, served from cache when fresh.
    async fn tenant_access(&self, tenant: TenantId) -> TrimlyResult<TenantAccess>;

    /// Gates one authenticated request. `read_only` marks safe methods.
    ///
    /// Super admins and customers are never gated; employees inherit their
    /// tenant's window.
    async fn authorize_request(&self, claims: &Claims, read_only: bool) -> TrimlyResult<()>;

    /// Fails with `PlanLimitExceeded` when `tenant` may not open another salon.
    async fn ensure_salon_quota(&self, tenant: TenantId) -> TrimlyResult<()>;

    /// Fails with `PlanLimitExceeded` when `salon` may not add active staff.
    async fn ensure_staff_quota(&self, tenant: TenantId, salon: SalonId) -> TrimlyResult<()>;

    /// Drops the cached window of `tenant`.
    fn invalidate(&self, tenant: TenantId);
}

/// Decides whether a request may proceed under `window`.
pub fn gate(window: &AccessWindow, read_only: bool) -> TrimlyResult<()> {
    match window.level() {
        AccessLevel::Full => Ok(()),
        AccessLevel::ReadOnly if read_only => Ok(()),
        AccessLevel::ReadOnly => Err(TrimlyError::ReadOnlyAccess(
            "Demo access is read-only; subscribe to make changes".to_string(),
        )),
        AccessLevel::None => Err(TrimlyError::SubscriptionExpired(
            "Your trial or subscription has ended; choose a plan to continue".to_string(),
        )),
    }
}

/// Access service implementation.
pub struct AccessServiceImpl {
    users: Arc<dyn UserRepository>,
    plans: Arc<dyn PlanRepository>,
    salons: Arc<dyn SalonRepository>,
    staff: Arc<dyn StaffRepository>,
    config: SubscriptionConfig,
    clock: Arc<dyn Clock>,
    cache: TtlCache<TenantId, TenantAccess>,
}

impl AccessServiceImpl {
    /// Creates a new access service.
    pub fn new(repos: &Repositories, config: SubscriptionConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = TtlCache::new(config.access_cache_ttl(), Arc::clone(&clock));
        Self {
            users: Arc::clone(&repos.users),
            plans: Arc::clone(&repos.plans),
            salons: Arc::clone(&repos.salons),
            staff: Arc::clone(&repos.staff),
            config,
            clock,
            cache,
        }
    }

    const fn trial_limits(&self) -> PlanLimits {
        PlanLimits {
            max_salons: self.config.trial_max_salons,
            max_staff_per_salon: self.config.trial_max_staff_per_salon,
        }
    }

    async fn evaluate(&self, tenant: TenantId) -> TrimlyResult<TenantAccess> {
        let owner = self
            .users
            .find_by_id(tenant)
            .await?
            .ok_or_else(|| TrimlyError::forbidden("Tenant account no longer exists"))?;

        let window = owner.subscription.window_at(self.clock.now());
        let limits = match window {
            AccessWindow::Paid { plan_id, .. } => self
                .plans
                .find_by_id(plan_id)
                .await?
                .map_or_else(|| self.trial_limits(), |plan| plan.limits()),
            AccessWindow::Trial { .. } | AccessWindow::Demo { .. } => self.trial_limits(),
            AccessWindow::Expired => PlanLimits {
                max_salons: 0,
                max_staff_per_salon: 0,
            },
        };
        debug!("Tenant {} evaluated as {}", tenant, window.name());
        Ok(TenantAccess { window, limits })
    }
}

#[async_trait]
impl AccessService for AccessServiceImpl {
    async fn tenant_access(&self, tenant: TenantId) -> TrimlyResult<TenantAccess> {
        let now = self.clock.now();
        if let Some(cached) = self.cache.get(&tenant) {
            // A window that closed since it was cached is re-evaluated.
            if cached.window.ends_at().map_or(true, |end| end > now) {
                return Ok(cached);
            }
        }
        let access = self.evaluate(tenant).await?;
        self.cache.insert(tenant, access);
        Ok(access)
    }

    async fn authorize_request(&self, claims: &Claims, read_only: bool) -> TrimlyResult<()> {
        if claims.is_super_admin() || claims.is_customer() {
            return Ok(());
        }
        let tenant = claims.require_tenant()?;
        let access = self.tenant_access(tenant).await?;
        gate(&access.window, read_only)
    }

    async fn ensure_salon_quota(&self, tenant: TenantId) -> TrimlyResult<()> {
        let access = self.tenant_access(tenant).await?;
        let owned = self.salons.count_by_owner(tenant).await?;
        if owned >= u64::from(access.limits.max_salons) {
            return Err(TrimlyError::PlanLimitExceeded(format!(
                "The {} window allows {} salon(s)",
                access.window.name(),
                access.limits.max_salons
            )));
        }
        Ok(())
    }

    async fn ensure_staff_quota(&self, tenant: TenantId, salon: SalonId) -> TrimlyResult<()> {
        let access = self.tenant_access(tenant).await?;
        let active = self.staff.count_active(salon).await?;
        if active >= u64::from(access.limits.max_staff_per_salon) {
            return Err(TrimlyError::PlanLimitExceeded(format!(
                "The {} window allows {} active staff per salon",
                access.window.name(),
                access.limits.max_staff_per_salon
            )));
        }
        Ok(())
    }

    fn invalidate(&self, tenant: TenantId) {
        if self.cache.invalidate(&tenant) {
            info!("Access cache invalidated for tenant {}", tenant);
        }
    }
}

impl std::fmt::Debug for AccessServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessServiceImpl")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use trimly_core::{Plan, UserRole};

    #[test]
    fn test_gate_levels() {
        let end = chrono::Utc::now();
        assert!(gate(&AccessWindow::Trial { ends_at: end }, false).is_ok());
        assert!(gate(&AccessWindow::Demo { ends_at: end }, true).is_ok());
        assert_eq!(
            gate(&AccessWindow::Demo { ends_at: end }, false).unwrap_err().error_code(),
            "READ_ONLY_ACCESS"
        );
        assert_eq!(
            gate(&AccessWindow::Expired, true).unwrap_err().error_code(),
            "SUBSCRIPTION_EXPIRED"
        );
    }

    #[tokio::test]
    async fn test_trial_then_expired() {
        let ctx = TestContext::new();
        let (_, claims) = ctx.admin("asha@glow.example").await;
        let access = ctx.services.access.clone();

        assert!(access.authorize_request(&claims, false).await.is_ok());

        ctx.clock.advance(Duration::days(15));
        let err = access.authorize_request(&claims, true).await.unwrap_err();
        assert_eq!(err.error_code(), "SUBSCRIPTION_EXPIRED");
    }

    #[tokio::test]
    async fn test_employees_inherit_tenant_window() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, staff) = ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;

        assert!(ctx.services.access.authorize_request(&staff, false).await.is_ok());
        ctx.clock.advance(Duration::days(30));
        assert!(ctx.services.access.authorize_request(&staff, true).await.is_err());
    }

    #[tokio::test]
    async fn test_super_admin_and_customers_not_gated() {
        let ctx = TestContext::new();
        let operator = ctx.super_admin().await;
        ctx.clock.advance(Duration::days(400));
        assert!(ctx.services.access.authorize_request(&operator, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_cached_window_is_reused_until_invalidated() {
        let ctx = TestContext::new();
        let (mut owner, _) = ctx.admin("asha@glow.example").await;
        let first = ctx.services.access.tenant_access(owner.id).await.unwrap();
        assert_eq!(first.window.name(), "trial");

        // Grant a demo behind the cache's back: the trial is still served.
        owner.subscription.trial_ends_at = None;
        owner.subscription.grant_demo(ctx.clock.now(), 7);
        ctx.repos.users.update(&owner).await.unwrap();
        let cached = ctx.services.access.tenant_access(owner.id).await.unwrap();
        assert_eq!(cached.window.name(), "trial");

        ctx.services.access.invalidate(owner.id);
        let fresh = ctx.services.access.tenant_access(owner.id).await.unwrap();
        assert_eq!(fresh.window.name(), "demo");
    }

    #[tokio::test]
    async fn test_cached_window_that_closed_is_reevaluated() {
        let ctx = TestContext::new();
        let (mut owner, _) = ctx.admin("asha@glow.example").await;
        owner.subscription.trial_ends_at = Some(ctx.clock.now() + Duration::seconds(30));
        ctx.repos.users.update(&owner).await.unwrap();

        let before = ctx.services.access.tenant_access(owner.id).await.unwrap();
        assert_eq!(before.window.name(), "trial");
        ctx.clock.advance(Duration::seconds(31));
        let after = ctx.services.access.tenant_access(owner.id).await.unwrap();
        assert_eq!(after.window, AccessWindow::Expired);
    }

    #[tokio::test]
    async fn test_paid_limits_come_from_plan() {
        let ctx = TestContext::new();
        let (mut owner, _) = ctx.admin("asha@glow.example").await;
        let plan = Plan::new("Chain".into(), None, dec!(99), 30, 5, 25, ctx.clock.now());
        ctx.repos.plans.save(&plan).await.unwrap();
        owner.subscription.subscribe(&plan, ctx.clock.now());
        ctx.repos.users.update(&owner).await.unwrap();

        let access = ctx.services.access.tenant_access(owner.id).await.unwrap();
        assert_eq!(access.limits.max_salons, 5);
        assert_eq!(access.limits.max_staff_per_salon, 25);
    }

    #[tokio::test]
    async fn test_trial_salon_quota() {
        let ctx = TestContext::new();
        let (owner, admin) = ctx.admin("asha@glow.example").await;
        assert!(ctx.services.access.ensure_salon_quota(owner.id).await.is_ok());
        ctx.salon(&admin).await;
        let err = ctx.services.access.ensure_salon_quota(owner.id).await.unwrap_err();
        assert_eq!(err.error_code(), "PLAN_LIMIT_EXCEEDED");
    }
}
