//! Service catalog controller: categories and salon services.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::debug;
use trimly_core::{Category, CategoryId, SalonId, SalonService, ServiceId};
use trimly_service::{
    AssignStaffRequest, CreateCategoryRequest, CreateServiceRequest, ServiceQuery, UpdateCategoryRequest,
    UpdateServiceRequest,
};

/// Creates the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/salons/:id/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
        .route("/salons/:id/services", get(list_services).post(create_service))
        .route("/services/:id", get(get_service).put(update_service).delete(delete_service))
        .route("/services/:id/staff", put(assign_staff))
}

/// Public catalog of a salon, mounted without authentication.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/salons/:id/services", get(public_services))
}

async fn list_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
) -> ApiResult<Vec<Category>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let categories = state.services.catalog.list_categories(&user, salon_id).await?;
    ok(categories)
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> CreatedResult<Category> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let category = state.services.catalog.create_category(&user, salon_id, request).await?;
    created(category)
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<Category> {
    let id: CategoryId = parse_id("category", &id)?;
    let category = state.services.catalog.update_category(&user, id, request).await?;
    ok(category)
}

async fn delete_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CategoryId = parse_id("category", &id)?;
    state.services.catalog.delete_category(&user, id).await?;
    Ok(no_content())
}

async fn list_services(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    Query(query): Query<ServiceQuery>,
) -> ApiResult<Vec<SalonService>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let services = state.services.catalog.list_services(&user, salon_id, query).await?;
    ok(services)
}

async fn public_services(State(state): State<AppState>, Path(salon_id): Path<String>) -> ApiResult<Vec<SalonService>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let services = state.services.catalog.public_services(salon_id).await?;
    ok(services)
}

async fn create_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateServiceRequest>,
) -> CreatedResult<SalonService> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    debug!("Create service request for salon {}: {}", salon_id, request.name);

    let service = state.services.catalog.create_service(&user, salon_id, request).await?;
    created(service)
}

async fn get_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<SalonService> {
    let id: ServiceId = parse_id("service", &id)?;
    let service = state.services.catalog.get_service(&user, id).await?;
    ok(service)
}

async fn update_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateServiceRequest>,
) -> ApiResult<SalonService> {
    let id: ServiceId = parse_id("service", &id)?;
    let service = state.services.catalog.update_service(&user, id, request).await?;
    ok(service)
}

async fn delete_service(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: ServiceId = parse_id("service", &id)?;
    state.services.catalog.delete_service(&user, id).await?;
    Ok(no_content())
}

/// Replaces the staff who perform a service.
async fn assign_staff(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<AssignStaffRequest>,
) -> ApiResult<SalonService> {
    let id: ServiceId = parse_id("service", &id)?;
    let service = state.services.catalog.assign_staff(&user, id, request).await?;
    ok(service)
}
