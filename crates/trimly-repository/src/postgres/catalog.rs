//! PostgreSQL category and service repositories.

use crate::{
    traits::{CategoryRepository, SalonServiceRepository, ServiceFilter},
    DatabasePoolInterface,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{
    Category, CategoryId, SalonId, SalonService, ServiceId, StaffId, TrimlyError, TrimlyResult,
};
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "id, salon_id, name, description, created_at, updated_at";

const SERVICE_SELECT: &str = r#"
    SELECT s.id, s.salon_id, s.category_id, s.name, s.description, s.duration_minutes,
           s.price, s.is_active, s.created_at, s.updated_at,
           ARRAY(
               SELECT ss.staff_id FROM staff_services ss
               WHERE ss.service_id = s.id ORDER BY ss.staff_id
           ) AS staff_ids
    FROM services s
"#;

/// PostgreSQL category repository implementation.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgCategoryRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    salon_id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::from_uuid(row.id),
            salon_id: SalonId::from_uuid(row.salon_id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> TrimlyResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Category::from))
    }

    async fn find_by_name(&self, salon_id: SalonId, name: &str) -> TrimlyResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {} FROM categories WHERE salon_id = $1 AND LOWER(name) = LOWER($2)",
            CATEGORY_COLUMNS
        ))
        .bind(salon_id.into_inner())
        .bind(name)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Category::from))
    }

    async fn find_by_salon(&self, salon_id: SalonId) -> TrimlyResult<Vec<Category>> {
        debug!("Finding categories of salon: {}", salon_id);

        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {} FROM categories WHERE salon_id = $1 ORDER BY name",
            CATEGORY_COLUMNS
        ))
        .bind(salon_id.into_inner())
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn save(&self, category: &Category) -> TrimlyResult<Category> {
        debug!("Saving new category: {}", category.name);

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories ({}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CATEGORY_COLUMNS, CATEGORY_COLUMNS
        ))
        .bind(category.id.into_inner())
        .bind(category.salon_id.into_inner())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(Category::from(row))
    }

    async fn update(&self, category: &Category) -> TrimlyResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE categories SET name = $2, description = $3, updated_at = $4 WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(category.id.into_inner())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("Category", category.id))?;

        Ok(Category::from(row))
    }

    async fn delete(&self, id: CategoryId) -> TrimlyResult<bool> {
        debug!("Deleting category: {}", id);

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for PgCategoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCategoryRepository").finish_non_exhaustive()
    }
}

/// PostgreSQL salon service repository implementation.
#[derive(Clone)]
pub struct PgSalonServiceRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgSalonServiceRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn reload(&self, id: ServiceId) -> TrimlyResult<SalonService> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Service", id))
    }
}

#[derive(Debug, FromRow)]
struct ServiceRow {
    id: Uuid,
    salon_id: Uuid,
    category_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    duration_minutes: i32,
    price: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    staff_ids: Vec<Uuid>,
}

impl From<ServiceRow> for SalonService {
    fn from(row: ServiceRow) -> Self {
        SalonService {
            id: ServiceId::from_uuid(row.id),
            salon_id: SalonId::from_uuid(row.salon_id),
            category_id: row.category_id.map(CategoryId::from_uuid),
            name: row.name,
            description: row.description,
            duration_minutes: row.duration_minutes,
            price: row.price,
            is_active: row.is_active,
            staff_ids: row.staff_ids.into_iter().map(StaffId::from_uuid).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SalonServiceRepository for PgSalonServiceRepository {
    async fn find_by_id(&self, id: ServiceId) -> TrimlyResult<Option<SalonService>> {
        debug!("Finding service by id: {}", id);

        let row = sqlx::query_as::<_, ServiceRow>(&format!("{} WHERE s.id = $1", SERVICE_SELECT))
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(SalonService::from))
    }

    async fn find_by_ids(&self, ids: &[ServiceId]) -> TrimlyResult<Vec<SalonService>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();

        let rows = sqlx::query_as::<_, ServiceRow>(&format!("{} WHERE s.id = ANY($1)", SERVICE_SELECT))
            .bind(ids)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(SalonService::from).collect())
    }

    async fn find_by_salon(&self, salon_id: SalonId, filter: ServiceFilter) -> TrimlyResult<Vec<SalonService>> {
        debug!("Finding services of salon {} with {:?}", salon_id, filter);

        let rows = sqlx::query_as::<_, ServiceRow>(&format!(
            r#"
            {}
            WHERE s.salon_id = $1
              AND ($2::uuid IS NULL OR s.category_id = $2)
              AND ($3::boolean IS NULL OR s.is_active = $3)
            ORDER BY s.name
            "#,
            SERVICE_SELECT
        ))
        .bind(salon_id.into_inner())
        .bind(filter.category_id.map(CategoryId::into_inner))
        .bind(filter.active)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(SalonService::from).collect())
    }

    async fn save(&self, service: &SalonService) -> TrimlyResult<SalonService> {
        debug!("Saving new service: {}", service.name);

        sqlx::query(
            r#"
            INSERT INTO services (id, salon_id, category_id, name, description, duration_minutes,
                                  price, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(service.id.into_inner())
        .bind(service.salon_id.into_inner())
        .bind(service.category_id.map(CategoryId::into_inner))
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.duration_minutes)
        .bind(service.price)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(self.pool.inner())
        .await?;

        self.reload(service.id).await
    }

    async fn update(&self, service: &SalonService) -> TrimlyResult<SalonService> {
        debug!("Updating service: {}", service.id);

        let result = sqlx::query(
            r#"
            UPDATE services
            SET category_id = $2, name = $3, description = $4, duration_minutes = $5,
                price = $6, is_active = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(service.id.into_inner())
        .bind(service.category_id.map(CategoryId::into_inner))
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.duration_minutes)
        .bind(service.price)
        .bind(service.is_active)
        .bind(service.updated_at)
        .execute(self.pool.inner())
        .await?;

        if result.rows_affected() == 0 {
            return Err(TrimlyError::not_found("Service", service.id));
        }
        self.reload(service.id).await
    }

    async fn delete(&self, id: ServiceId) -> TrimlyResult<bool> {
        debug!("Deleting service: {}", id);

        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_staff(&self, id: ServiceId, staff_ids: &[StaffId]) -> TrimlyResult<()> {
        debug!("Replacing staff of service {} ({} members)", id, staff_ids.len());

        let staff: Vec<Uuid> = staff_ids.iter().map(|s| s.into_inner()).collect();
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query("DELETE FROM staff_services WHERE service_id = $1")
            .bind(id.into_inner())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO staff_services (staff_id, service_id) SELECT DISTINCT u.id, $1::uuid FROM UNNEST($2::uuid[]) AS u(id)",
        )
        .bind(id.into_inner())
        .bind(staff)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

impl std::fmt::Debug for PgSalonServiceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSalonServiceRepository").finish_non_exhaustive()
    }
}
