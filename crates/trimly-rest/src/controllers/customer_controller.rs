//! Customer self-service: passcode sign-in, profile, and own bookings.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, PaginationQuery, ValidatedJson},
    responses::{created, ok, ApiResult, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::debug;
use trimly_core::{Appointment, AppointmentId, Page};
use trimly_service::{
    CancelAppointmentRequest, CustomerAuthResponse, CustomerBookingRequest, CustomerResponse,
    OtpRequestedResponse, RefreshTokenRequest, RequestOtpRequest, UpdateCustomerRequest, VerifyOtpRequest,
};

/// Creates the customer router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/otp/request", post(request_otp))
        .route("/otp/verify", post(verify_otp))
        .route("/refresh", post(refresh_token))
        .route("/me", get(profile).put(update_profile))
        .route("/me/appointments", get(my_appointments).post(book))
        .route("/me/appointments/:id/cancel", post(cancel))
}

/// Sends a passcode to the phone. The code is never part of the response.
async fn request_otp(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RequestOtpRequest>,
) -> ApiResult<OtpRequestedResponse> {
    let response = state.services.customers.request_otp(request).await?;
    ok(response)
}

/// Signs a customer up or in with a passcode.
async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerifyOtpRequest>,
) -> ApiResult<CustomerAuthResponse> {
    let response = state.services.customers.verify_otp(request).await?;
    ok(response)
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<CustomerAuthResponse> {
    let response = state.services.customers.refresh_token(request).await?;
    ok(response)
}

async fn profile(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<CustomerResponse> {
    let response = state.services.customers.profile(&user).await?;
    ok(response)
}

async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateCustomerRequest>,
) -> ApiResult<CustomerResponse> {
    let response = state.services.customers.update_profile(&user, request).await?;
    ok(response)
}

async fn my_appointments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Page<Appointment>> {
    let response = state
        .services
        .appointments
        .my_appointments(&user, pagination.into())
        .await?;
    ok(response)
}

async fn book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CustomerBookingRequest>,
) -> CreatedResult<Appointment> {
    debug!("Customer booking at salon {} on {}", request.salon_id, request.date);

    let response = state.services.appointments.customer_book(&user, request).await?;
    created(response)
}

async fn cancel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    request: Option<Json<CancelAppointmentRequest>>,
) -> ApiResult<Appointment> {
    let id: AppointmentId = parse_id("appointment", &id)?;
    let Json(request) = request.unwrap_or_default();

    let response = state.services.appointments.cancel_own(&user, id, request).await?;
    ok(response)
}
