//! Staff roster controller.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::debug;
use trimly_core::{SalonId, Staff, StaffId};
use trimly_service::{AssignServicesRequest, CreateStaffRequest, StaffQuery, UpdateStaffRequest};

/// Creates the staff router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/salons/:id/staff", get(list_staff).post(create_staff))
        .route("/staff/:id", get(get_staff).put(update_staff).delete(delete_staff))
        .route("/staff/:id/deactivate", post(deactivate_staff))
        .route("/staff/:id/services", put(assign_services))
}

async fn list_staff(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    Query(query): Query<StaffQuery>,
) -> ApiResult<Vec<Staff>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let staff = state.services.staff.list_staff(&user, salon_id, query).await?;
    ok(staff)
}

async fn create_staff(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateStaffRequest>,
) -> CreatedResult<Staff> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    debug!("Create staff request for salon {}: {}", salon_id, request.name);

    let staff = state.services.staff.create_staff(&user, salon_id, request).await?;
    created(staff)
}

async fn get_staff(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Staff> {
    let id: StaffId = parse_id("staff", &id)?;
    let staff = state.services.staff.get_staff(&user, id).await?;
    ok(staff)
}

async fn update_staff(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStaffRequest>,
) -> ApiResult<Staff> {
    let id: StaffId = parse_id("staff", &id)?;
    let staff = state.services.staff.update_staff(&user, id, request).await?;
    ok(staff)
}

async fn deactivate_staff(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Staff> {
    let id: StaffId = parse_id("staff", &id)?;
    let staff = state.services.staff.deactivate_staff(&user, id).await?;
    ok(staff)
}

async fn delete_staff(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: StaffId = parse_id("staff", &id)?;
    state.services.staff.delete_staff(&user, id).await?;
    Ok(no_content())
}

/// Replaces the services a staff member performs.
async fn assign_services(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<AssignServicesRequest>,
) -> ApiResult<Staff> {
    let id: StaffId = parse_id("staff", &id)?;
    let staff = state.services.staff.assign_services(&user, id, request).await?;
    ok(staff)
}
