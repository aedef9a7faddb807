//! PostgreSQL salon repository implementation.

use super::limit_offset;
use crate::{traits::SalonRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{Page, PageRequest, Salon, SalonId, TenantId, TrimlyError, TrimlyResult, WeekdaySet};
use uuid::Uuid;

const SALON_COLUMNS: &str = "id, owner_id, name, address, phone, email, opening_time, closing_time, \
    working_days, holidays, slot_interval_minutes, utc_offset_minutes, is_active, created_at, updated_at";

/// PostgreSQL salon repository implementation.
#[derive(Clone)]
pub struct PgSalonRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgSalonRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn page_where(
        &self,
        owner: Option<TenantId>,
        page: PageRequest,
    ) -> TrimlyResult<Page<Salon>> {
        let owner = owner.map(TenantId::into_inner);

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM salons WHERE ($1::uuid IS NULL OR owner_id = $1)")
                .bind(owner)
                .fetch_one(self.pool.inner())
                .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, SalonRow>(&format!(
            r#"
            SELECT {} FROM salons
            WHERE ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY created_at
            LIMIT $2 OFFSET $3
            "#,
            SALON_COLUMNS
        ))
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Salon::from).collect(),
            page.page,
            page.size,
            total as u64,
        ))
    }
}

#[derive(Debug, FromRow)]
struct SalonRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    opening_time: NaiveTime,
    closing_time: NaiveTime,
    working_days: i16,
    holidays: Vec<NaiveDate>,
    slot_interval_minutes: i32,
    utc_offset_minutes: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SalonRow> for Salon {
    fn from(row: SalonRow) -> Self {
        let mut holidays = row.holidays;
        holidays.sort_unstable();
        holidays.dedup();

        Salon {
            id: SalonId::from_uuid(row.id),
            owner_id: TenantId::from_uuid(row.owner_id),
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            opening_time: row.opening_time,
            closing_time: row.closing_time,
            working_days: WeekdaySet::from_bits(row.working_days),
            holidays,
            slot_interval_minutes: row.slot_interval_minutes,
            utc_offset_minutes: row.utc_offset_minutes,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SalonRepository for PgSalonRepository {
    async fn find_by_id(&self, id: SalonId) -> TrimlyResult<Option<Salon>> {
        debug!("Finding salon by id: {}", id);

        let row = sqlx::query_as::<_, SalonRow>(&format!("SELECT {} FROM salons WHERE id = $1", SALON_COLUMNS))
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(Salon::from))
    }

    async fn find_by_owner(&self, owner_id: TenantId, page: PageRequest) -> TrimlyResult<Page<Salon>> {
        debug!("Finding salons of owner: {}", owner_id);
        self.page_where(Some(owner_id), page).await
    }

    async fn find_all(&self, page: PageRequest) -> TrimlyResult<Page<Salon>> {
        self.page_where(None, page).await
    }

    async fn count_by_owner(&self, owner_id: TenantId) -> TrimlyResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM salons WHERE owner_id = $1")
            .bind(owner_id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;

        Ok(count as u64)
    }

    async fn save(&self, salon: &Salon) -> TrimlyResult<Salon> {
        debug!("Saving new salon: {}", salon.name);

        let row = sqlx::query_as::<_, SalonRow>(&format!(
            r#"
            INSERT INTO salons ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            SALON_COLUMNS, SALON_COLUMNS
        ))
        .bind(salon.id.into_inner())
        .bind(salon.owner_id.into_inner())
        .bind(&salon.name)
        .bind(&salon.address)
        .bind(&salon.phone)
        .bind(&salon.email)
        .bind(salon.opening_time)
        .bind(salon.closing_time)
        .bind(salon.working_days.bits())
        .bind(&salon.holidays)
        .bind(salon.slot_interval_minutes)
        .bind(salon.utc_offset_minutes)
        .bind(salon.is_active)
        .bind(salon.created_at)
        .bind(salon.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(Salon::from(row))
    }

    async fn update(&self, salon: &Salon) -> TrimlyResult<Salon> {
        debug!("Updating salon: {}", salon.id);

        let row = sqlx::query_as::<_, SalonRow>(&format!(
            r#"
            UPDATE salons
            SET name = $2, address = $3, phone = $4, email = $5, opening_time = $6,
                closing_time = $7, working_days = $8, holidays = $9,
                slot_interval_minutes = $10, utc_offset_minutes = $11, is_active = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING {}
            "#,
            SALON_COLUMNS
        ))
        .bind(salon.id.into_inner())
        .bind(&salon.name)
        .bind(&salon.address)
        .bind(&salon.phone)
        .bind(&salon.email)
        .bind(salon.opening_time)
        .bind(salon.closing_time)
        .bind(salon.working_days.bits())
        .bind(&salon.holidays)
        .bind(salon.slot_interval_minutes)
        .bind(salon.utc_offset_minutes)
        .bind(salon.is_active)
        .bind(salon.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("Salon", salon.id))?;

        Ok(Salon::from(row))
    }

    async fn delete(&self, id: SalonId) -> TrimlyResult<bool> {
        debug!("Deleting salon: {}", id);

        let result = sqlx::query("DELETE FROM salons WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for PgSalonRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSalonRepository").finish_non_exhaustive()
    }
}
