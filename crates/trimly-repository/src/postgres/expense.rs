//! PostgreSQL expense repository implementation.

use super::{limit_offset, parse_column};
use crate::{
    traits::{ExpenseFilter, ExpenseRepository},
    DatabasePoolInterface,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use trimly_core::{
    Expense, ExpenseCategory, ExpenseId, Page, PageRequest, SalonId, TrimlyError, TrimlyResult, UserId,
};
use uuid::Uuid;

const EXPENSE_COLUMNS: &str = "id, salon_id, category, amount, expense_date, description, \
    payment_method, created_by, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"
    salon_id = $1
    AND ($2::date IS NULL OR expense_date >= $2)
    AND ($3::date IS NULL OR expense_date <= $3)
    AND ($4::text IS NULL OR category = $4)
"#;

/// PostgreSQL expense repository implementation.
#[derive(Clone)]
pub struct PgExpenseRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgExpenseRepository {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ExpenseRow {
    id: Uuid,
    salon_id: Uuid,
    category: String,
    amount: Decimal,
    expense_date: NaiveDate,
    description: Option<String>,
    payment_method: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = TrimlyError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        Ok(Expense {
            id: ExpenseId::from_uuid(row.id),
            salon_id: SalonId::from_uuid(row.salon_id),
            category: parse_column(&row.category, "expense category")?,
            amount: row.amount,
            expense_date: row.expense_date,
            description: row.description,
            payment_method: parse_column(&row.payment_method, "payment method")?,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CategoryTotalRow {
    category: String,
    total: Decimal,
}

#[async_trait]
impl ExpenseRepository for PgExpenseRepository {
    async fn find_by_id(&self, id: ExpenseId) -> TrimlyResult<Option<Expense>> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {} FROM expenses WHERE id = $1",
            EXPENSE_COLUMNS
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Expense::try_from).transpose()
    }

    async fn find_filtered(&self, filter: ExpenseFilter, page: PageRequest) -> TrimlyResult<Page<Expense>> {
        debug!("Listing expenses with {:?}", filter);

        let category = filter.category.map(|c| c.as_str());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM expenses WHERE {}", FILTER_CLAUSE))
            .bind(filter.salon_id.into_inner())
            .bind(filter.from)
            .bind(filter.to)
            .bind(category)
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {} FROM expenses WHERE {} ORDER BY expense_date DESC, created_at DESC LIMIT $5 OFFSET $6",
            EXPENSE_COLUMNS, FILTER_CLAUSE
        ))
        .bind(filter.salon_id.into_inner())
        .bind(filter.from)
        .bind(filter.to)
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.inner())
        .await?;

        let expenses = rows
            .into_iter()
            .map(Expense::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(expenses, page.page, page.size, total as u64))
    }

    async fn totals_by_category(&self, filter: ExpenseFilter) -> TrimlyResult<Vec<(ExpenseCategory, Decimal)>> {
        let rows = sqlx::query_as::<_, CategoryTotalRow>(&format!(
            "SELECT category, SUM(amount) AS total FROM expenses WHERE {} GROUP BY category ORDER BY category",
            FILTER_CLAUSE
        ))
        .bind(filter.salon_id.into_inner())
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.category.map(|c| c.as_str()))
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter()
            .map(|row| Ok((parse_column(&row.category, "expense category")?, row.total)))
            .collect()
    }

    async fn save(&self, expense: &Expense) -> TrimlyResult<Expense> {
        debug!("Saving new expense: {} {}", expense.category, expense.amount);

        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            "INSERT INTO expenses ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            EXPENSE_COLUMNS, EXPENSE_COLUMNS
        ))
        .bind(expense.id.into_inner())
        .bind(expense.salon_id.into_inner())
        .bind(expense.category.as_str())
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.description)
        .bind(expense.payment_method.as_str())
        .bind(expense.created_by.map(UserId::into_inner))
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .fetch_one(self.pool.inner())
        .await?;

        Expense::try_from(row)
    }

    async fn update(&self, expense: &Expense) -> TrimlyResult<Expense> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            r#"
            UPDATE expenses
            SET category = $2, amount = $3, expense_date = $4, description = $5,
                payment_method = $6, updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        ))
        .bind(expense.id.into_inner())
        .bind(expense.category.as_str())
        .bind(expense.amount)
        .bind(expense.expense_date)
        .bind(&expense.description)
        .bind(expense.payment_method.as_str())
        .bind(expense.updated_at)
        .fetch_optional(self.pool.inner())
        .await?
        .ok_or_else(|| TrimlyError::not_found("Expense", expense.id))?;

        Expense::try_from(row)
    }

    async fn delete(&self, id: ExpenseId) -> TrimlyResult<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for PgExpenseRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgExpenseRepository").finish_non_exhaustive()
    }
}
