//! PostgreSQL plan repository implementation.

use crate::{traits::PlanRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{Plan, PlanId, TrimlyError, TrimlyResult};
use uuid::Uuid;

const PLAN_COLUMNS: &str = "id, name, description, price, duration_days, max_salons, \
    max_staff_per_salon, is_active, created_at, updated_at";

/// PostgreSQL plan repository implementation.
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgPlanRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    duration_days: i32,
    max_salons: i32,
    max_staff_per_salon: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            duration_days: row.duration_days,
            max_salons: row.max_salons,
            max_staff_per_salon: row.max_staff_per_salon,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_by_id(&self, id: PlanId) -> TrimlyResult<Option<Plan>> {
        debug!("Finding plan by id: {}", id);

        let row = sqlx::query_as::<_, PlanRow>(&format!("SELECT {} FROM plans WHERE id = $1", PLAN_COLUMNS))
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(Plan::from))
    }

    async fn find_by_name(&self, name: &str) -> TrimlyResult<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {} FROM plans WHERE LOWER(name) = LOWER($1)",
            PLAN_COLUMNS
        ))
        .bind(name)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Plan::from))
    }

    async fn find_all(&self, active_only: bool) -> TrimlyResult<Vec<Plan>> {
        let rows = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {} FROM plans WHERE ($1 = FALSE OR is_active) ORDER BY price, name",
            PLAN_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Plan::from).collect())
    }

    async fn save(&self, plan: &Plan) -> TrimlyResult<Plan> {
        debug!("Saving new plan: {}", plan.name);

        let row = sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            INSERT INTO plans ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PLAN_COLUMNS, PLAN_COLUMNS
        ))
        .bind(plan.id.into_inner())
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.duration_days)
        .bind(plan.max_salons)
        .bind(plan.max_staff_per_salon)
        .bind(plan.is_active)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(Plan::from(row))
    }

    async fn update(&self, plan: &Plan) -> TrimlyResult<Plan> {
        debug!("Updating plan: {}", plan.id);

        let row = sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            UPDATE plans
            SET name = $2, description = $3, price = $4, duration_days = $5,
                max_salons = $6, max_staff_per_salon = $7, is_active = $8, updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            PLAN_COLUMNS
        ))
        .bind(plan.id.into_inner())
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price)
        .bind(plan.duration_days)
        .bind(plan.max_salons)
        .bind(plan.max_staff_per_salon)
        .bind(plan.is_active)
        .bind(plan.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("Plan", plan.id))?;

        Ok(Plan::from(row))
    }
}

impl std::fmt::Debug for PgPlanRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPlanRepository").finish_non_exhaustive()
    }
}
