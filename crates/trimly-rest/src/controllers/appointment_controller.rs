//! Appointment controller: front-desk bookings, walk-ins, and slot search.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, PaginationQuery, ValidatedJson},
    responses::{created, ok, ApiResult, AppError, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use trimly_core::{Appointment, AppointmentId, Page, SalonId, ServiceId, StaffId, TrimlyError};
use trimly_service::{
    AppointmentQuery, AvailableSlot, BookAppointmentRequest, CancelAppointmentRequest, RescheduleRequest,
    SlotQuery, UpdateAppointmentStatusRequest, WalkInRequest,
};

/// Creates the appointment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/salons/:id/appointments", get(list_appointments).post(book))
        .route("/salons/:id/walk-ins", post(walk_in))
        .route("/appointments/:id", get(get_appointment))
        .route("/appointments/:id/reschedule", put(reschedule))
        .route("/appointments/:id/status", patch(update_status))
        .route("/appointments/:id/cancel", post(cancel))
}

/// Slot search for customers, mounted without authentication.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/salons/:id/slots", get(available_slots))
}

/// Query string of a slot search; `service_ids` is comma-separated.
///
/// Values arrive as text so malformed input is reported in the error envelope.
#[derive(Debug, Default, Deserialize)]
pub struct SlotParams {
    pub date: Option<String>,
    pub service_ids: Option<String>,
    pub staff_id: Option<String>,
}

impl TryFrom<SlotParams> for SlotQuery {
    type Error = AppError;

    fn try_from(params: SlotParams) -> Result<Self, Self::Error> {
        let date = params
            .date
            .ok_or_else(|| AppError(TrimlyError::validation("Query parameter 'date' is required")))?;
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError(TrimlyError::validation(format!("Invalid date: {date}"))))?;

        let service_ids = params
            .service_ids
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_id::<ServiceId>("service", raw))
            .collect::<Result<Vec<_>, _>>()?;

        let staff_id = params
            .staff_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_id::<StaffId>("staff", raw))
            .transpose()?;

        Ok(Self {
            date,
            service_ids,
            staff_id,
        })
    }
}

async fn list_appointments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    Query(query): Query<AppointmentQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Page<Appointment>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let page = state
        .services
        .appointments
        .list_appointments(&user, salon_id, query, pagination.into())
        .await?;
    ok(page)
}

async fn book(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    ValidatedJson(request): ValidatedJson<BookAppointmentRequest>,
) -> CreatedResult<Appointment> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    debug!(
        "Booking request at salon {} for staff {} on {} {}",
        salon_id, request.staff_id, request.date, request.start_time
    );

    let appointment = state.services.appointments.book(&user, salon_id, request).await?;
    created(appointment)
}

/// Seats a walk-in in the earliest free slot from now.
async fn walk_in(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    ValidatedJson(request): ValidatedJson<WalkInRequest>,
) -> CreatedResult<Appointment> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let appointment = state.services.appointments.walk_in(&user, salon_id, request).await?;
    created(appointment)
}

async fn available_slots(
    State(state): State<AppState>,
    Path(salon_id): Path<String>,
    Query(params): Query<SlotParams>,
) -> ApiResult<Vec<AvailableSlot>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let slots = state
        .services
        .appointments
        .available_slots(salon_id, params.try_into()?)
        .await?;
    ok(slots)
}

async fn get_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Appointment> {
    let id: AppointmentId = parse_id("appointment", &id)?;
    let appointment = state.services.appointments.get_appointment(&user, id).await?;
    ok(appointment)
}

async fn reschedule(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> ApiResult<Appointment> {
    let id: AppointmentId = parse_id("appointment", &id)?;
    let appointment = state.services.appointments.reschedule(&user, id, request).await?;
    ok(appointment)
}

async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> ApiResult<Appointment> {
    let id: AppointmentId = parse_id("appointment", &id)?;
    debug!("Status change of appointment {} to {}", id, request.status);

    let appointment = state.services.appointments.update_status(&user, id, request).await?;
    ok(appointment)
}

async fn cancel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    request: Option<Json<CancelAppointmentRequest>>,
) -> ApiResult<Appointment> {
    let id: AppointmentId = parse_id("appointment", &id)?;
    let Json(request) = request.unwrap_or_default();

    let appointment = state.services.appointments.cancel(&user, id, request).await?;
    ok(appointment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(date: &str, service_ids: &str, staff_id: Option<&str>) -> SlotParams {
        SlotParams {
            date: Some(date.to_string()),
            service_ids: Some(service_ids.to_string()),
            staff_id: staff_id.map(str::to_string),
        }
    }

    #[test]
    fn test_slot_params_split_service_ids() {
        let first = ServiceId::new();
        let second = ServiceId::new();
        let staff = StaffId::new();

        let query = SlotQuery::try_from(params(
            "2025-03-11",
            &format!("{first}, {second},"),
            Some(&staff.to_string()),
        ))
        .unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert_eq!(query.service_ids, vec![first, second]);
        assert_eq!(query.staff_id, Some(staff));
    }

    #[test]
    fn test_slot_params_reject_malformed_values() {
        let service = ServiceId::new().to_string();
        for bad in [
            params("2025-03-11", "not-a-uuid", None),
            params("11/03/2025", &service, None),
            params("2025-03-11", &service, Some("ravi")),
            SlotParams::default(),
        ] {
            let err = SlotQuery::try_from(bad).unwrap_err();
            assert_eq!(err.0.error_code(), "VALIDATION_ERROR");
        }
    }
}
