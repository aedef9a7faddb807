//! PostgreSQL appointment repository implementation.

use super::{limit_offset, parse_column};
use crate::{
    traits::{AppointmentFilter, AppointmentRepository},
    DatabasePoolInterface,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{
    Appointment, AppointmentId, CustomerId, Page, PageRequest, SalonId, ServiceId, StaffId,
    TrimlyError, TrimlyResult, UserId,
};
use uuid::Uuid;

const APPOINTMENT_COLUMNS: &str = r#"
    id, salon_id, customer_id, customer_name, customer_phone, staff_id, service_ids,
    date, start_time, end_time, kind, status, total_price, notes, cancellation_reason,
    created_by, created_at, updated_at
"#;

const FILTER_CLAUSE: &str = r#"
    salon_id = $1
    AND ($2::date IS NULL OR date = $2)
    AND ($3::uuid IS NULL OR staff_id = $3)
    AND ($4::text IS NULL OR status = $4)
"#;

/// PostgreSQL appointment repository implementation.
#[derive(Clone)]
pub struct PgAppointmentRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgAppointmentRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: Uuid,
    salon_id: Uuid,
    customer_id: Option<Uuid>,
    customer_name: String,
    customer_phone: Option<String>,
    staff_id: Uuid,
    service_ids: Vec<Uuid>,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    kind: String,
    status: String,
    total_price: Decimal,
    notes: Option<String>,
    cancellation_reason: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = TrimlyError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: AppointmentId::from_uuid(row.id),
            salon_id: SalonId::from_uuid(row.salon_id),
            customer_id: row.customer_id.map(CustomerId::from_uuid),
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            staff_id: StaffId::from_uuid(row.staff_id),
            service_ids: row.service_ids.into_iter().map(ServiceId::from_uuid).collect(),
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            kind: parse_column(&row.kind, "appointment kind")?,
            status: parse_column(&row.status, "appointment status")?,
            total_price: row.total_price,
            notes: row.notes,
            cancellation_reason: row.cancellation_reason,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_appointments(rows: Vec<AppointmentRow>) -> TrimlyResult<Vec<Appointment>> {
    rows.into_iter().map(Appointment::try_from).collect()
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn find_by_id(&self, id: AppointmentId) -> TrimlyResult<Option<Appointment>> {
        debug!("Finding appointment by id: {}", id);

        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            APPOINTMENT_COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Appointment::try_from).transpose()
    }

    async fn find_by_salon_on(&self, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE salon_id = $1 AND date = $2 ORDER BY start_time, id",
            APPOINTMENT_COLUMNS
        ))
        .bind(salon_id.into_inner())
        .bind(date)
        .fetch_all(self.pool.inner())
        .await?;

        into_appointments(rows)
    }

    async fn find_by_staff_on(&self, staff_id: StaffId, date: NaiveDate) -> TrimlyResult<Vec<Appointment>> {
        debug!("Finding appointments of staff {} on {}", staff_id, date);

        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE staff_id = $1 AND date = $2 ORDER BY start_time, id",
            APPOINTMENT_COLUMNS
        ))
        .bind(staff_id.into_inner())
        .bind(date)
        .fetch_all(self.pool.inner())
        .await?;

        into_appointments(rows)
    }

    async fn find_filtered(&self, filter: AppointmentFilter, page: PageRequest) -> TrimlyResult<Page<Appointment>> {
        debug!("Listing appointments with {:?}", filter);

        let staff = filter.staff_id.map(StaffId::into_inner);
        let status = filter.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM appointments WHERE {}", FILTER_CLAUSE))
            .bind(filter.salon_id.into_inner())
            .bind(filter.date)
            .bind(staff)
            .bind(status)
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE {} ORDER BY date, start_time, id LIMIT $5 OFFSET $6",
            APPOINTMENT_COLUMNS, FILTER_CLAUSE
        ))
        .bind(filter.salon_id.into_inner())
        .bind(filter.date)
        .bind(staff)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(Page::new(into_appointments(rows)?, page.page, page.size, total as u64))
    }

    async fn find_by_customer(&self, customer_id: CustomerId, page: PageRequest) -> TrimlyResult<Page<Appointment>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE customer_id = $1")
            .bind(customer_id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE customer_id = $1
            ORDER BY date DESC, start_time DESC
            LIMIT $2 OFFSET $3
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(customer_id.into_inner())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(Page::new(into_appointments(rows)?, page.page, page.size, total as u64))
    }

    async fn count_upcoming(&self, salon_id: SalonId, staff_id: Option<StaffId>, from: NaiveDate) -> TrimlyResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE salon_id = $1
              AND ($2::uuid IS NULL OR staff_id = $2)
              AND date >= $3
              AND status IN ('booked', 'confirmed')
            "#,
        )
        .bind(salon_id.into_inner())
        .bind(staff_id.map(StaffId::into_inner))
        .bind(from)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(count as u64)
    }

    async fn save(&self, appointment: &Appointment) -> TrimlyResult<Appointment> {
        debug!("Saving new appointment: {}", appointment.id);

        let service_ids: Vec<Uuid> = appointment.service_ids.iter().map(|s| s.into_inner()).collect();
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            INSERT INTO appointments ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS, APPOINTMENT_COLUMNS
        ))
        .bind(appointment.id.into_inner())
        .bind(appointment.salon_id.into_inner())
        .bind(appointment.customer_id.map(CustomerId::into_inner))
        .bind(&appointment.customer_name)
        .bind(&appointment.customer_phone)
        .bind(appointment.staff_id.into_inner())
        .bind(service_ids)
        .bind(appointment.date)
        .bind(appointment.start_time)
        .bind(appointment.end_time)
        .bind(appointment.kind.as_str())
        .bind(appointment.status.as_str())
        .bind(appointment.total_price)
        .bind(&appointment.notes)
        .bind(&appointment.cancellation_reason)
        .bind(appointment.created_by.map(UserId::into_inner))
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Appointment::try_from(row)
    }

    async fn update(&self, appointment: &Appointment) -> TrimlyResult<Appointment> {
        debug!("Updating appointment: {}", appointment.id);

        let service_ids: Vec<Uuid> = appointment.service_ids.iter().map(|s| s.into_inner()).collect();
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            UPDATE appointments
            SET customer_name = $2, customer_phone = $3, staff_id = $4, service_ids = $5,
                date = $6, start_time = $7, end_time = $8, status = $9, total_price = $10,
                notes = $11, cancellation_reason = $12, updated_at = $13
            WHERE id = $1
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(appointment.id.into_inner())
        .bind(&appointment.customer_name)
        .bind(&appointment.customer_phone)
        .bind(appointment.staff_id.into_inner())
        .bind(service_ids)
        .bind(appointment.date)
        .bind(appointment.start_time)
        .bind(appointment.end_time)
        .bind(appointment.status.as_str())
        .bind(appointment.total_price)
        .bind(&appointment.notes)
        .bind(&appointment.cancellation_reason)
        .bind(appointment.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("Appointment", appointment.id))?;

        Appointment::try_from(row)
    }
}

impl std::fmt::Debug for PgAppointmentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAppointmentRepository").finish_non_exhaustive()
    }
}
