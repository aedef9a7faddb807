//! PostgreSQL attendance repository implementation.

use super::parse_column;
use crate::{traits::AttendanceRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{Attendance, AttendanceId, SalonId, StaffId, TrimlyError, TrimlyResult};
use uuid::Uuid;

const ATTENDANCE_COLUMNS: &str =
    "id, salon_id, staff_id, date, status, check_in, check_out, notes, created_at, updated_at";

/// PostgreSQL attendance repository implementation.
#[derive(Clone)]
pub struct PgAttendanceRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgAttendanceRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AttendanceRow {
    id: Uuid,
    salon_id: Uuid,
    staff_id: Uuid,
    date: NaiveDate,
    status: String,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = TrimlyError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(Attendance {
            id: AttendanceId::from_uuid(row.id),
            salon_id: SalonId::from_uuid(row.salon_id),
            staff_id: StaffId::from_uuid(row.staff_id),
            date: row.date,
            status: parse_column(&row.status, "attendance status")?,
            check_in: row.check_in,
            check_out: row.check_out,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn find_by_id(&self, id: AttendanceId) -> TrimlyResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE id = $1",
            ATTENDANCE_COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Attendance::try_from).transpose()
    }

    async fn find_by_staff_on(&self, staff_id: StaffId, date: NaiveDate) -> TrimlyResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE staff_id = $1 AND date = $2",
            ATTENDANCE_COLUMNS
        ))
        .bind(staff_id.into_inner())
        .bind(date)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Attendance::try_from).transpose()
    }

    async fn find_by_salon_on(&self, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Attendance>> {
        debug!("Finding attendance of salon {} on {}", salon_id, date);

        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE salon_id = $1 AND date = $2 ORDER BY staff_id",
            ATTENDANCE_COLUMNS
        ))
        .bind(salon_id.into_inner())
        .bind(date)
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter().map(Attendance::try_from).collect()
    }

    async fn find_by_staff_between(
        &self,
        staff_id: StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TrimlyResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE staff_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date",
            ATTENDANCE_COLUMNS
        ))
        .bind(staff_id.into_inner())
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter().map(Attendance::try_from).collect()
    }

    async fn save(&self, attendance: &Attendance) -> TrimlyResult<Attendance> {
        debug!("Saving attendance for staff {} on {}", attendance.staff_id, attendance.date);

        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "INSERT INTO attendance ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            ATTENDANCE_COLUMNS, ATTENDANCE_COLUMNS
        ))
        .bind(attendance.id.into_inner())
        .bind(attendance.salon_id.into_inner())
        .bind(attendance.staff_id.into_inner())
        .bind(attendance.date)
        .bind(attendance.status.as_str())
        .bind(attendance.check_in)
        .bind(attendance.check_out)
        .bind(&attendance.notes)
        .bind(attendance.created_at)
        .bind(attendance.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Attendance::try_from(row)
    }

    async fn update(&self, attendance: &Attendance) -> TrimlyResult<Attendance> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            UPDATE attendance
            SET status = $2, check_in = $3, check_out = $4, notes = $5, updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            ATTENDANCE_COLUMNS
        ))
        .bind(attendance.id.into_inner())
        .bind(attendance.status.as_str())
        .bind(attendance.check_in)
        .bind(attendance.check_out)
        .bind(&attendance.notes)
        .bind(attendance.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("Attendance", attendance.id))?;

        Attendance::try_from(row)
    }
}

impl std::fmt::Debug for PgAttendanceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAttendanceRepository").finish_non_exhaustive()
    }
}
