//! PostgreSQL user repository implementation.

use super::{limit_offset, parse_column};
use crate::{traits::UserRepository, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{
    Email, Page, PageRequest, PlanId, SalonId, Subscription, TenantId, TrimlyError, TrimlyResult,
    User, UserId,
};
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, tenant_id, salon_id, name, email, phone, password_hash, role, status,
    plan_id, plan_expires_at, trial_ends_at, demo_ends_at,
    last_login_at, created_at, updated_at
"#;

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgUserRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, clause: &str, value: &str) -> TrimlyResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} AND status <> 'deleted'",
            USER_COLUMNS, clause
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(User::try_from).transpose()
    }
}

/// Database row representation of a user.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    salon_id: Option<Uuid>,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    status: String,
    plan_id: Option<Uuid>,
    plan_expires_at: Option<DateTime<Utc>>,
    trial_ends_at: Option<DateTime<Utc>>,
    demo_ends_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = TrimlyError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from_uuid(row.id),
            tenant_id: row.tenant_id.map(TenantId::from_uuid),
            salon_id: row.salon_id.map(SalonId::from_uuid),
            name: row.name,
            email: Email::new_unchecked(row.email),
            phone: row.phone,
            password_hash: row.password_hash,
            role: parse_column(&row.role, "role")?,
            status: parse_column(&row.status, "status")?,
            subscription: Subscription {
                plan_id: row.plan_id.map(PlanId::from_uuid),
                plan_expires_at: row.plan_expires_at,
                trial_ends_at: row.trial_ends_at,
                demo_ends_at: row.demo_ends_at,
            },
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> TrimlyResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND status <> 'deleted'",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> TrimlyResult<Option<User>> {
        debug!("Finding user by email: {}", email);
        self.fetch_one_by("LOWER(email) = LOWER($1)", email).await
    }

    async fn exists_by_email(&self, email: &str) -> TrimlyResult<bool> {
        let result: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND status <> 'deleted' LIMIT 1",
        )
        .bind(email)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(result.is_some())
    }

    async fn find_employees(
        &self,
        tenant_id: TenantId,
        salon_id: Option<SalonId>,
        page: PageRequest,
    ) -> TrimlyResult<Page<User>> {
        debug!("Finding employees of tenant {} (salon {:?})", tenant_id, salon_id);

        let filter = r#"
            tenant_id = $1
            AND role IN ('manager', 'staff')
            AND status <> 'deleted'
            AND ($2::uuid IS NULL OR salon_id = $2)
        "#;
        let salon = salon_id.map(SalonId::into_inner);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {}", filter))
            .bind(tenant_id.into_inner())
            .bind(salon)
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "SELECT {} FROM users WHERE {} ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            USER_COLUMNS, filter
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(tenant_id.into_inner())
            .bind(salon)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.inner())
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(users, page.page, page.size, total as u64))
    }

    async fn save(&self, user: &User) -> TrimlyResult<User> {
        debug!("Saving new user: {}", user.email);

        let sql = format!(
            r#"
            INSERT INTO users ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            USER_COLUMNS, USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id.into_inner())
            .bind(user.tenant_id.map(TenantId::into_inner))
            .bind(user.salon_id.map(SalonId::into_inner))
            .bind(&user.name)
            .bind(user.email.as_str())
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.status.as_str())
            .bind(user.subscription.plan_id.map(PlanId::into_inner))
            .bind(user.subscription.plan_expires_at)
            .bind(user.subscription.trial_ends_at)
            .bind(user.subscription.demo_ends_at)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(self.pool.inner())
            .await?;

        User::try_from(row)
    }

    async fn update(&self, user: &User) -> TrimlyResult<User> {
        debug!("Updating user: {}", user.id);

        let sql = format!(
            r#"
            UPDATE users
            SET salon_id = $2, name = $3, email = $4, phone = $5, password_hash = $6,
                role = $7, status = $8, plan_id = $9, plan_expires_at = $10,
                trial_ends_at = $11, demo_ends_at = $12, last_login_at = $13, updated_at = $14
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id.into_inner())
            .bind(user.salon_id.map(SalonId::into_inner))
            .bind(&user.name)
            .bind(user.email.as_str())
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.status.as_str())
            .bind(user.subscription.plan_id.map(PlanId::into_inner))
            .bind(user.subscription.plan_expires_at)
            .bind(user.subscription.trial_ends_at)
            .bind(user.subscription.demo_ends_at)
            .bind(user.last_login_at)
            .bind(user.updated_at)
            .fetch_optional(self.pool.inner())
            .await?
            .ok_or_else(|| TrimlyError::not_found("User", user.id))?;

        User::try_from(row)
    }

    async fn delete(&self, id: UserId) -> TrimlyResult<bool> {
        debug!("Soft deleting user: {}", id);

        let result = sqlx::query(
            "UPDATE users SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status <> 'deleted'",
        )
        .bind(id.into_inner())
        .execute(self.pool.inner())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for PgUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgUserRepository").finish_non_exhaustive()
    }
}
