//! PostgreSQL staff repository implementation.

use crate::{traits::StaffRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{SalonId, ServiceId, Staff, StaffId, TrimlyError, TrimlyResult, UserId, WeekdaySet};
use uuid::Uuid;

const STAFF_SELECT: &str = r#"
    SELECT st.id, st.salon_id, st.user_id, st.name, st.phone, st.email, st.designation,
           st.weekly_off, st.is_active, st.joined_on, st.created_at, st.updated_at,
           ARRAY(
               SELECT ss.service_id FROM staff_services ss
               WHERE ss.staff_id = st.id ORDER BY ss.service_id
           ) AS service_ids
    FROM staff st
"#;

/// PostgreSQL staff repository implementation.
#[derive(Clone)]
pub struct PgStaffRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgStaffRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn reload(&self, id: StaffId) -> TrimlyResult<Staff> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Staff", id))
    }
}

#[derive(Debug, FromRow)]
struct StaffRow {
    id: Uuid,
    salon_id: Uuid,
    user_id: Option<Uuid>,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    designation: Option<String>,
    weekly_off: i16,
    is_active: bool,
    joined_on: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    service_ids: Vec<Uuid>,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Staff {
            id: StaffId::from_uuid(row.id),
            salon_id: SalonId::from_uuid(row.salon_id),
            user_id: row.user_id.map(UserId::from_uuid),
            name: row.name,
            phone: row.phone,
            email: row.email,
            designation: row.designation,
            weekly_off: WeekdaySet::from_bits(row.weekly_off),
            is_active: row.is_active,
            joined_on: row.joined_on,
            service_ids: row.service_ids.into_iter().map(ServiceId::from_uuid).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl StaffRepository for PgStaffRepository {
    async fn find_by_id(&self, id: StaffId) -> TrimlyResult<Option<Staff>> {
        debug!("Finding staff by id: {}", id);

        let row = sqlx::query_as::<_, StaffRow>(&format!("{} WHERE st.id = $1", STAFF_SELECT))
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(Staff::from))
    }

    async fn find_by_ids(&self, ids: &[StaffId]) -> TrimlyResult<Vec<Staff>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();

        let rows = sqlx::query_as::<_, StaffRow>(&format!("{} WHERE st.id = ANY($1)", STAFF_SELECT))
            .bind(ids)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(Staff::from).collect())
    }

    async fn find_by_user(&self, user_id: UserId) -> TrimlyResult<Option<Staff>> {
        let row = sqlx::query_as::<_, StaffRow>(&format!("{} WHERE st.user_id = $1", STAFF_SELECT))
            .bind(user_id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(Staff::from))
    }

    async fn find_by_salon(&self, salon_id: SalonId, active: Option<bool>) -> TrimlyResult<Vec<Staff>> {
        debug!("Finding staff of salon {} (active: {:?})", salon_id, active);

        let rows = sqlx::query_as::<_, StaffRow>(&format!(
            "{} WHERE st.salon_id = $1 AND ($2::boolean IS NULL OR st.is_active = $2) ORDER BY st.id",
            STAFF_SELECT
        ))
        .bind(salon_id.into_inner())
        .bind(active)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Staff::from).collect())
    }

    async fn count_active(&self, salon_id: SalonId) -> TrimlyResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE salon_id = $1 AND is_active")
            .bind(salon_id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;

        Ok(count as u64)
    }

    async fn save(&self, staff: &Staff) -> TrimlyResult<Staff> {
        debug!("Saving new staff member: {}", staff.name);

        sqlx::query(
            r#"
            INSERT INTO staff (id, salon_id, user_id, name, phone, email, designation,
                               weekly_off, is_active, joined_on, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(staff.id.into_inner())
        .bind(staff.salon_id.into_inner())
        .bind(staff.user_id.map(UserId::into_inner))
        .bind(&staff.name)
        .bind(&staff.phone)
        .bind(&staff.email)
        .bind(&staff.designation)
        .bind(staff.weekly_off.bits())
        .bind(staff.is_active)
        .bind(staff.joined_on)
        .bind(staff.created_at)
        .bind(staff.updated_at)
        .execute(self.pool.inner())
        .await?;

        self.reload(staff.id).await
    }

    async fn update(&self, staff: &Staff) -> TrimlyResult<Staff> {
        debug!("Updating staff member: {}", staff.id);

        let result = sqlx::query(
            r#"
            UPDATE staff
            SET user_id = $2, name = $3, phone = $4, email = $5, designation = $6,
                weekly_off = $7, is_active = $8, joined_on = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(staff.id.into_inner())
        .bind(staff.user_id.map(UserId::into_inner))
        .bind(&staff.name)
        .bind(&staff.phone)
        .bind(&staff.email)
        .bind(&staff.designation)
        .bind(staff.weekly_off.bits())
        .bind(staff.is_active)
        .bind(staff.joined_on)
        .bind(staff.updated_at)
        .execute(self.pool.inner())
        .await?;

        if result.rows_affected() == 0 {
            return Err(TrimlyError::not_found("Staff", staff.id));
        }
        self.reload(staff.id).await
    }

    async fn delete(&self, id: StaffId) -> TrimlyResult<bool> {
        debug!("Deleting staff member: {}", id);

        let result = sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_services(&self, id: StaffId, service_ids: &[ServiceId]) -> TrimlyResult<()> {
        debug!("Replacing services of staff {} ({} services)", id, service_ids.len());

        let services: Vec<Uuid> = service_ids.iter().map(|s| s.into_inner()).collect();
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query("DELETE FROM staff_services WHERE staff_id = $1")
            .bind(id.into_inner())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO staff_services (staff_id, service_id) SELECT DISTINCT $1::uuid, u.id FROM UNNEST($2::uuid[]) AS u(id)",
        )
        .bind(id.into_inner())
        .bind(services)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

impl std::fmt::Debug for PgStaffRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStaffRepository").finish_non_exhaustive()
    }
}
