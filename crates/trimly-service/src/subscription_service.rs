//! Tenant subscriptions: buying plans, checking status, granting access.

use crate::access_service::AccessService;
use crate::dto::{GrantAccessRequest, SubscribeRequest, SubscriptionStatusResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{
    Clock, Interface, Permission, TenantId, TrimlyError, TrimlyResult, User, UserRole, ValidateExt,
};
use trimly_repository::Repositories;
use trimly_security::{Claims, ClaimsExt};

/// Subscription service trait.
#[async_trait]
pub trait SubscriptionService: Interface + Send + Sync {
    /// Window, expiry, and limits of the caller's tenant.
    async fn status(&self, claims: &Claims) -> TrimlyResult<SubscriptionStatusResponse>;

    /// Activates or renews a plan for the caller's tenant.
    async fn subscribe(&self, claims: &Claims, request: SubscribeRequest) -> TrimlyResult<SubscriptionStatusResponse>;

    /// Status of any tenant, for operators.
    async fn tenant_status(&self, claims: &Claims, tenant: TenantId) -> TrimlyResult<SubscriptionStatusResponse>;

    /// Opens a demo window or extends the trial of a tenant.
    async fn grant_access(
        &self,
        claims: &Claims,
        tenant: TenantId,
        request: GrantAccessRequest,
    ) -> TrimlyResult<SubscriptionStatusResponse>;
}

/// Subscription service implementation.
pub struct SubscriptionServiceImpl {
    repos: Repositories,
    access: Arc<dyn AccessService>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionServiceImpl {
    pub fn new(repos: Repositories, access: Arc<dyn AccessService>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, access, clock }
    }

    async fn load_tenant(&self, tenant: TenantId) -> TrimlyResult<User> {
        self.repos
            .users
            .find_by_id(tenant)
            .await?
            .filter(|user| user.role == UserRole::Admin && user.tenant_id == Some(tenant))
            .ok_or_else(|| TrimlyError::not_found("Tenant", tenant))
    }

    async fn build_status(&self, owner: &User) -> TrimlyResult<SubscriptionStatusResponse> {
        let access = self.access.tenant_access(owner.id).await?;
        let plan = match owner.subscription.plan_id {
            Some(plan_id) => self.repos.plans.find_by_id(plan_id).await?,
            None => None,
        };
        Ok(SubscriptionStatusResponse {
            tenant_id: owner.id,
            window: access.window,
            access: access.window.level(),
            expires_at: access.window.ends_at(),
            plan,
            limits: access.limits,
            trial_ends_at: owner.subscription.trial_ends_at,
            demo_ends_at: owner.subscription.demo_ends_at,
        })
    }
}

#[async_trait]
impl SubscriptionService for SubscriptionServiceImpl {
    async fn status(&self, claims: &Claims) -> TrimlyResult<SubscriptionStatusResponse> {
        let tenant = claims.require_tenant()?;
        let owner = self.load_tenant(tenant).await?;
        self.build_status(&owner).await
    }

    async fn subscribe(&self, claims: &Claims, request: SubscribeRequest) -> TrimlyResult<SubscriptionStatusResponse> {
        claims.require_permission(Permission::SubscriptionManage)?;
        let tenant = claims.require_tenant()?;
        debug!("Tenant {} subscribing to plan {}", tenant, request.plan_id);

        let plan = self
            .repos
            .plans
            .find_by_id(request.plan_id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Plan", request.plan_id))?;
        if !plan.is_active {
            return Err(TrimlyError::business_rule(format!(
                "Plan '{}' is no longer offered",
                plan.name
            )));
        }

        let mut owner = self.load_tenant(tenant).await?;
        let now = self.clock.now();
        owner.subscription.subscribe(&plan, now);
        owner.updated_at = now;
        let owner = self.repos.users.update(&owner).await?;
        self.access.invalidate(tenant);

        info!(
            "Tenant {} subscribed to {} until {:?}",
            tenant, plan.name, owner.subscription.plan_expires_at
        );
        self.build_status(&owner).await
    }

    async fn tenant_status(&self, claims: &Claims, tenant: TenantId) -> TrimlyResult<SubscriptionStatusResponse> {
        claims.require_permission(Permission::TenantAccessGrant)?;
        let owner = self.load_tenant(tenant).await?;
        self.build_status(&owner).await
    }

    async fn grant_access(
        &self,
        claims: &Claims,
        tenant: TenantId,
        request: GrantAccessRequest,
    ) -> TrimlyResult<SubscriptionStatusResponse> {
        claims.require_permission(Permission::TenantAccessGrant)?;
        request.validate_request()?;

        let mut owner = self.load_tenant(tenant).await?;
        let now = self.clock.now();
        match (request.demo_days, request.trial_days) {
            (Some(days), None) => {
                owner.subscription.grant_demo(now, days);
                info!("Demo of {} days granted to tenant {}", days, tenant);
            }
            (None, Some(days)) => {
                owner.subscription.extend_trial(now, days);
                info!("Trial of tenant {} extended by {} days", tenant, days);
            }
            _ => {
                return Err(TrimlyError::validation(
                    "Give exactly one of demo_days or trial_days",
                ))
            }
        }
        owner.updated_at = now;
        let owner = self.repos.users.update(&owner).await?;
        self.access.invalidate(tenant);

        self.build_status(&owner).await
    }
}

impl std::fmt::Debug for SubscriptionServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use trimly_core::{AccessLevel, AccessWindow, Plan};

    async fn plan(ctx: &TestContext, days: i32) -> Plan {
        let plan = Plan::new("Pro".into(), None, dec!(49), days, 3, 10, ctx.clock.now());
        ctx.repos.plans.save(&plan).await.unwrap()
    }

    #[tokio::test]
    async fn test_new_tenant_is_on_trial() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let status = ctx.services.subscriptions.status(&admin).await.unwrap();
        assert_eq!(status.access, AccessLevel::Full);
        assert_eq!(status.expires_at, Some(ctx.clock.now() + Duration::days(14)));
        assert_eq!(status.limits.max_salons, 1);
        assert!(status.plan.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_after_expiry_restores_access() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let pro = plan(&ctx, 30).await;

        ctx.clock.advance(Duration::days(20));
        assert!(ctx.services.access.authorize_request(&admin, true).await.is_err());

        let status = ctx
            .services
            .subscriptions
            .subscribe(&admin, SubscribeRequest { plan_id: pro.id })
            .await
            .unwrap();
        assert_eq!(
            status.window,
            AccessWindow::Paid {
                plan_id: pro.id,
                expires_at: ctx.clock.now() + Duration::days(30),
            }
        );
        assert_eq!(status.limits.max_salons, 3);
        assert!(ctx.services.access.authorize_request(&admin, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_renewing_same_plan_extends_from_expiry() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let pro = plan(&ctx, 30).await;
        let start = ctx.clock.now();

        ctx.services
            .subscriptions
            .subscribe(&admin, SubscribeRequest { plan_id: pro.id })
            .await
            .unwrap();
        ctx.clock.advance(Duration::days(10));
        let renewed = ctx
            .services
            .subscriptions
            .subscribe(&admin, SubscribeRequest { plan_id: pro.id })
            .await
            .unwrap();
        assert_eq!(renewed.expires_at, Some(start + Duration::days(60)));
    }

    #[tokio::test]
    async fn test_inactive_plan_cannot_be_bought() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let mut retired = plan(&ctx, 30).await;
        retired.is_active = false;
        ctx.repos.plans.update(&retired).await.unwrap();

        let err = ctx
            .services
            .subscriptions
            .subscribe(&admin, SubscribeRequest { plan_id: retired.id })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_grant_demo_is_read_only() {
        let ctx = TestContext::new();
        let (owner, admin) = ctx.admin("asha@glow.example").await;
        let operator = ctx.super_admin().await;
        ctx.clock.advance(Duration::days(15));

        let status = ctx
            .services
            .subscriptions
            .grant_access(
                &operator,
                owner.id,
                GrantAccessRequest {
                    demo_days: Some(7),
                    trial_days: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(status.access, AccessLevel::ReadOnly);
        assert!(ctx.services.access.authorize_request(&admin, true).await.is_ok());
        let err = ctx.services.access.authorize_request(&admin, false).await.unwrap_err();
        assert_eq!(err.error_code(), "READ_ONLY_ACCESS");
    }

    #[tokio::test]
    async fn test_grant_requires_exactly_one_window() {
        let ctx = TestContext::new();
        let (owner, admin) = ctx.admin("asha@glow.example").await;
        let operator = ctx.super_admin().await;

        let both = GrantAccessRequest {
            demo_days: Some(3),
            trial_days: Some(3),
        };
        let err = ctx
            .services
            .subscriptions
            .grant_access(&operator, owner.id, both)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let by_admin = ctx
            .services
            .subscriptions
            .grant_access(&admin, owner.id, GrantAccessRequest::default())
            .await
            .unwrap_err();
        assert_eq!(by_admin.status_code(), 403);
    }

    #[tokio::test]
    async fn test_extend_trial() {
        let ctx = TestContext::new();
        let (owner, _) = ctx.admin("asha@glow.example").await;
        let operator = ctx.super_admin().await;
        let status = ctx
            .services
            .subscriptions
            .grant_access(
                &operator,
                owner.id,
                GrantAccessRequest {
                    demo_days: None,
                    trial_days: Some(7),
                },
            )
            .await
            .unwrap();
        assert_eq!(status.trial_ends_at, Some(ctx.clock.now() + Duration::days(21)));
    }
}
