//! Employee account controller.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, PaginationQuery, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::debug;
use trimly_core::{Page, UserId};
use trimly_service::{
    CreateEmployeeRequest, EmployeeQuery, UpdateEmployeeRequest, UpdateUserStatusRequest, UserResponse,
};

/// Creates the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/status", patch(update_user_status))
}

/// Employees of the caller's tenant; managers see their own salon only.
async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<EmployeeQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Page<UserResponse>> {
    let response = state
        .services
        .users
        .list_employees(&user, query, pagination.into())
        .await?;
    ok(response)
}

/// Create a manager or staff login for one salon.
async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateEmployeeRequest>,
) -> CreatedResult<UserResponse> {
    debug!("Create employee request: {} as {}", request.email, request.role);

    let response = state.services.users.create_employee(&user, request).await?;
    created(response)
}

async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let id: UserId = parse_id("user", &id)?;
    let response = state.services.users.get_employee(&user, id).await?;
    ok(response)
}

async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateEmployeeRequest>,
) -> ApiResult<UserResponse> {
    let id: UserId = parse_id("user", &id)?;
    let response = state.services.users.update_employee(&user, id, request).await?;
    ok(response)
}

/// Suspend or reactivate an employee.
async fn update_user_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserStatusRequest>,
) -> ApiResult<UserResponse> {
    let id: UserId = parse_id("user", &id)?;
    debug!("Update user status request: {} -> {}", id, request.status);

    let response = state.services.users.set_status(&user, id, request).await?;
    ok(response)
}

async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UserId = parse_id("user", &id)?;
    state.services.users.delete_employee(&user, id).await?;
    Ok(no_content())
}
