//! Tenant subscription and operator access grants.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::debug;
use trimly_core::TenantId;
use trimly_service::{GrantAccessRequest, SubscribeRequest, SubscriptionStatusResponse};

/// Routes of the caller's own subscription, nested under `/subscription`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(status).post(subscribe))
}

/// Operator routes, nested under `/tenants`.
pub fn tenant_router() -> Router<AppState> {
    Router::new().route("/:id/access", get(tenant_status).post(grant_access))
}

async fn status(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<SubscriptionStatusResponse> {
    let response = state.services.subscriptions.status(&user).await?;
    ok(response)
}

/// Activates or renews a plan. Payment is out of band.
async fn subscribe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<SubscriptionStatusResponse> {
    debug!("Subscribe request for plan {}", request.plan_id);

    let response = state.services.subscriptions.subscribe(&user, request).await?;
    ok(response)
}

async fn tenant_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<SubscriptionStatusResponse> {
    let tenant: TenantId = parse_id("tenant", &id)?;
    let response = state.services.subscriptions.tenant_status(&user, tenant).await?;
    ok(response)
}

async fn grant_access(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<GrantAccessRequest>,
) -> ApiResult<SubscriptionStatusResponse> {
    let tenant: TenantId = parse_id("tenant", &id)?;
    debug!("Access grant for tenant {}", tenant);

    let response = state.services.subscriptions.grant_access(&user, tenant, request).await?;
    ok(response)
}
