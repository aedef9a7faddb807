//! Attendance controller: daily register, self check-in/out, monthly summary.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::debug;
use trimly_core::{Attendance, SalonId, StaffId};
use trimly_service::{AttendanceDayQuery, AttendanceSummary, ClockRequest, MarkAttendanceRequest, MonthQuery};

/// Creates the attendance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attendance", post(mark))
        .route("/attendance/check-in", post(check_in))
        .route("/attendance/check-out", post(check_out))
        .route("/salons/:id/attendance", get(list_day))
        .route("/staff/:id/attendance/summary", get(monthly_summary))
}

/// Records or overwrites one staff member's day.
async fn mark(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<MarkAttendanceRequest>,
) -> ApiResult<Attendance> {
    debug!("Attendance mark for staff {} on {}", request.staff_id, request.date);

    let attendance = state.services.attendance.mark(&user, request).await?;
    ok(attendance)
}

async fn check_in(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    request: Option<Json<ClockRequest>>,
) -> ApiResult<Attendance> {
    let Json(request) = request.unwrap_or_default();
    let attendance = state.services.attendance.check_in(&user, request).await?;
    ok(attendance)
}

async fn check_out(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    request: Option<Json<ClockRequest>>,
) -> ApiResult<Attendance> {
    let Json(request) = request.unwrap_or_default();
    let attendance = state.services.attendance.check_out(&user, request).await?;
    ok(attendance)
}

async fn list_day(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    Query(query): Query<AttendanceDayQuery>,
) -> ApiResult<Vec<Attendance>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let records = state.services.attendance.list_day(&user, salon_id, query.date).await?;
    ok(records)
}

async fn monthly_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(staff_id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<AttendanceSummary> {
    let staff_id: StaffId = parse_id("staff", &staff_id)?;
    let summary = state
        .services
        .attendance
        .monthly_summary(&user, staff_id, query.year, query.month)
        .await?;
    ok(summary)
}
