//! Salon (branch) controller.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, PaginationQuery, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::debug;
use trimly_core::{Page, Salon, SalonId};
use trimly_service::{CreateSalonRequest, HolidaysRequest, UpdateSalonRequest};

/// Creates the salon router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/salons", get(list_salons).post(create_salon))
        .route("/salons/:id", get(get_salon).put(update_salon).delete(delete_salon))
        .route("/salons/:id/holidays", post(add_holidays).delete(remove_holidays))
}

async fn list_salons(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Page<Salon>> {
    let response = state.services.salons.list_salons(&user, pagination.into()).await?;
    ok(response)
}

async fn create_salon(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateSalonRequest>,
) -> CreatedResult<Salon> {
    debug!("Create salon request: {}", request.name);

    let salon = state.services.salons.create_salon(&user, request).await?;
    created(salon)
}

async fn get_salon(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Salon> {
    let id: SalonId = parse_id("salon", &id)?;
    let salon = state.services.salons.get_salon(&user, id).await?;
    ok(salon)
}

async fn update_salon(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateSalonRequest>,
) -> ApiResult<Salon> {
    let id: SalonId = parse_id("salon", &id)?;
    let salon = state.services.salons.update_salon(&user, id, request).await?;
    ok(salon)
}

async fn delete_salon(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: SalonId = parse_id("salon", &id)?;
    state.services.salons.delete_salon(&user, id).await?;
    Ok(no_content())
}

async fn add_holidays(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<HolidaysRequest>,
) -> ApiResult<Salon> {
    let id: SalonId = parse_id("salon", &id)?;
    let salon = state.services.salons.add_holidays(&user, id, request).await?;
    ok(salon)
}

async fn remove_holidays(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<HolidaysRequest>,
) -> ApiResult<Salon> {
    let id: SalonId = parse_id("salon", &id)?;
    let salon = state.services.salons.remove_holidays(&user, id, request).await?;
    ok(salon)
}
