//! PostgreSQL customer and OTP challenge repositories.

use crate::{
    traits::{CustomerRepository, OtpRepository},
    DatabasePoolInterface,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{Customer, CustomerId, OtpChallenge, TrimlyError, TrimlyResult};
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, last_login_at, created_at, updated_at";

/// PostgreSQL customer repository implementation.
#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgCustomerRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    name: Option<String>,
    phone: String,
    email: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: CustomerId::from_uuid(row.id),
            name: row.name,
            phone: row.phone,
            email: row.email,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_by_id(&self, id: CustomerId) -> TrimlyResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn find_by_phone(&self, phone: &str) -> TrimlyResult<Option<Customer>> {
        debug!("Finding customer by phone: {}", phone);

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE phone = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn save(&self, customer: &Customer) -> TrimlyResult<Customer> {
        debug!("Saving new customer: {}", customer.id);

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customers ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            CUSTOMER_COLUMNS, CUSTOMER_COLUMNS
        ))
        .bind(customer.id.into_inner())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.last_login_at)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(Customer::from(row))
    }

    async fn update(&self, customer: &Customer) -> TrimlyResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET name = $2, email = $3, last_login_at = $4, updated_at = $5
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(customer.id.into_inner())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.last_login_at)
        .bind(customer.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("Customer", customer.id))?;

        Ok(Customer::from(row))
    }
}

impl std::fmt::Debug for PgCustomerRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCustomerRepository").finish_non_exhaustive()
    }
}

/// PostgreSQL OTP challenge repository implementation.
#[derive(Clone)]
pub struct PgOtpRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgOtpRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OtpRow {
    phone: String,
    code_hash: String,
    attempts: i32,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<OtpRow> for OtpChallenge {
    fn from(row: OtpRow) -> Self {
        OtpChallenge {
            phone: row.phone,
            code_hash: row.code_hash,
            attempts: row.attempts,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl OtpRepository for PgOtpRepository {
    async fn find(&self, phone: &str) -> TrimlyResult<Option<OtpChallenge>> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT phone, code_hash, attempts, expires_at, created_at FROM otp_challenges WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(OtpChallenge::from))
    }

    async fn upsert(&self, challenge: &OtpChallenge) -> TrimlyResult<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_challenges (phone, code_hash, attempts, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone) DO UPDATE
            SET code_hash = EXCLUDED.code_hash, attempts = EXCLUDED.attempts,
                expires_at = EXCLUDED.expires_at, created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&challenge.phone)
        .bind(&challenge.code_hash)
        .bind(challenge.attempts)
        .bind(challenge.expires_at)
        .bind(challenge.created_at)
        .execute(self.pool.inner())
        .await?;

        Ok(())
    }

    async fn consume_attempt(
        &self,
        phone: &str,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> TrimlyResult<Option<OtpChallenge>> {
        let row = sqlx::query_as::<_, OtpRow>(
            r#"
            UPDATE otp_challenges SET attempts = attempts + 1
            WHERE phone = $1 AND attempts < $2 AND expires_at > $3
            RETURNING phone, code_hash, attempts, expires_at, created_at
            "#,
        )
        .bind(phone)
        .bind(max_attempts)
        .bind(now)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(OtpChallenge::from))
    }

    async fn delete(&self, phone: &str) -> TrimlyResult<bool> {
        let result = sqlx::query("DELETE FROM otp_challenges WHERE phone = $1")
            .bind(phone)
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for PgOtpRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgOtpRepository").finish_non_exhaustive()
    }
}
