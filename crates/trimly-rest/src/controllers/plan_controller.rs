//! Subscription plan controller.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{created, ok, ApiResult, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tracing::debug;
use trimly_core::{Plan, PlanId};
use trimly_service::{CreatePlanRequest, UpdatePlanRequest};

/// Creates the plan router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active).post(create_plan))
        .route("/all", get(list_all))
        .route("/:id", get(get_plan).put(update_plan).delete(deactivate_plan))
}

/// Plans a tenant can subscribe to. No authentication required.
async fn list_active(State(state): State<AppState>) -> ApiResult<Vec<Plan>> {
    let plans = state.services.plans.list_active().await?;
    ok(plans)
}

/// Every plan, including deactivated ones (super admin only).
async fn list_all(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<Vec<Plan>> {
    let plans = state.services.plans.list_all(&user).await?;
    ok(plans)
}

async fn get_plan(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Plan> {
    let id: PlanId = parse_id("plan", &id)?;
    let plan = state.services.plans.get_plan(id).await?;
    ok(plan)
}

async fn create_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreatePlanRequest>,
) -> CreatedResult<Plan> {
    debug!("Create plan request: {}", request.name);

    let plan = state.services.plans.create_plan(&user, request).await?;
    created(plan)
}

async fn update_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdatePlanRequest>,
) -> ApiResult<Plan> {
    let id: PlanId = parse_id("plan", &id)?;
    let plan = state.services.plans.update_plan(&user, id, request).await?;
    ok(plan)
}

/// Plans are never removed; deleting one takes it off sale.
async fn deactivate_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Plan> {
    let id: PlanId = parse_id("plan", &id)?;
    let plan = state.services.plans.deactivate_plan(&user, id).await?;
    ok(plan)
}
