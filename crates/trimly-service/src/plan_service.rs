//! Subscription plan catalog.

use crate::dto::{CreatePlanRequest, UpdatePlanRequest};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{Clock, Interface, Permission, Plan, PlanId, TrimlyError, TrimlyResult, ValidateExt};
use trimly_repository::PlanRepository;
use trimly_security::{Claims, ClaimsExt};

/// Plan service trait.
#[async_trait]
pub trait PlanService: Interface + Send + Sync {
    /// Plans open for purchase, cheapest first.
    async fn list_active(&self) -> TrimlyResult<Vec<Plan>>;

    /// Every plan, including retired ones.
    async fn list_all(&self, claims: &Claims) -> TrimlyResult<Vec<Plan>>;

    async fn get_plan(&self, id: PlanId) -> TrimlyResult<Plan>;

    async fn create_plan(&self, claims: &Claims, request: CreatePlanRequest) -> TrimlyResult<Plan>;

    async fn update_plan(&self, claims: &Claims, id: PlanId, request: UpdatePlanRequest) -> TrimlyResult<Plan>;

    /// Retires a plan. Tenants already on it keep it until expiry.
    async fn deactivate_plan(&self, claims: &Claims, id: PlanId) -> TrimlyResult<Plan>;
}

/// Plan service implementation.
pub struct PlanServiceImpl {
    plans: Arc<dyn PlanRepository>,
    clock: Arc<dyn Clock>,
}

impl PlanServiceImpl {
    pub fn new(plans: Arc<dyn PlanRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { plans, clock }
    }

    async fn load(&self, id: PlanId) -> TrimlyResult<Plan> {
        self.plans
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Plan", id))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<PlanId>) -> TrimlyResult<()> {
        match self.plans.find_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => Err(TrimlyError::conflict(format!(
                "Plan '{name}' already exists"
            ))),
            _ => Ok(()),
        }
    }
}

fn check_price(price: Decimal) -> TrimlyResult<()> {
    if price.is_sign_negative() {
        return Err(TrimlyError::validation("price: must not be negative"));
    }
    Ok(())
}

#[async_trait]
impl PlanService for PlanServiceImpl {
    async fn list_active(&self) -> TrimlyResult<Vec<Plan>> {
        self.plans.find_all(true).await
    }

    async fn list_all(&self, claims: &Claims) -> TrimlyResult<Vec<Plan>> {
        claims.require_permission(Permission::PlanManage)?;
        self.plans.find_all(false).await
    }

    async fn get_plan(&self, id: PlanId) -> TrimlyResult<Plan> {
        self.load(id).await
    }

    async fn create_plan(&self, claims: &Claims, request: CreatePlanRequest) -> TrimlyResult<Plan> {
        debug!("Creating plan: {}", request.name);
        claims.require_permission(Permission::PlanManage)?;
        request.validate_request()?;
        check_price(request.price)?;

        let name = request.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let plan = Plan::new(
            name,
            request.description,
            request.price,
            request.duration_days,
            request.max_salons,
            request.max_staff_per_salon,
            self.clock.now(),
        );
        let saved = self.plans.save(&plan).await?;
        info!("Plan created: {} ({})", saved.name, saved.id);
        Ok(saved)
    }

    async fn update_plan(&self, claims: &Claims, id: PlanId, request: UpdatePlanRequest) -> TrimlyResult<Plan> {
        claims.require_permission(Permission::PlanManage)?;
        request.validate_request()?;
        let mut plan = self.load(id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            self.ensure_name_free(&name, Some(id)).await?;
            plan.name = name;
        }
        if let Some(description) = request.description {
            plan.description = Some(description);
        }
        if let Some(price) = request.price {
            check_price(price)?;
            plan.price = price;
        }
        if let Some(days) = request.duration_days {
            plan.duration_days = days;
        }
        if let Some(max) = request.max_salons {
            plan.max_salons = max;
        }
        if let Some(max) = request.max_staff_per_salon {
            plan.max_staff_per_salon = max;
        }
        if let Some(active) = request.is_active {
            plan.is_active = active;
        }
        plan.updated_at = self.clock.now();

        let updated = self.plans.update(&plan).await?;
        info!("Plan updated: {}", updated.id);
        Ok(updated)
    }

    async fn deactivate_plan(&self, claims: &Claims, id: PlanId) -> TrimlyResult<Plan> {
        claims.require_permission(Permission::PlanManage)?;
        let mut plan = self.load(id).await?;
        plan.is_active = false;
        plan.updated_at = self.clock.now();

        let updated = self.plans.update(&plan).await?;
        info!("Plan deactivated: {}", updated.id);
        Ok(updated)
    }
}

impl std::fmt::Debug for PlanServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanServiceImpl").finish_non_exhaustive()
    }
}
