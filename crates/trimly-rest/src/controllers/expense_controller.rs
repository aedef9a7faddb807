//! Expense ledger controller.

use super::parse_id;
use crate::{
    extractors::{AuthenticatedUser, PaginationQuery, ValidatedJson},
    responses::{created, no_content, ok, ApiResult, AppError, CreatedResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::debug;
use trimly_core::{Expense, ExpenseId, Page, SalonId};
use trimly_service::{CreateExpenseRequest, ExpenseQuery, ExpenseSummary, UpdateExpenseRequest};

/// Creates the expense router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/salons/:id/expenses", get(list_expenses).post(create_expense))
        .route("/salons/:id/expenses/summary", get(summary))
        .route("/expenses/:id", get(get_expense).put(update_expense).delete(delete_expense))
}

/// Expenses of a salon, filtered by date range (`from`, `to`) and `category`.
async fn list_expenses(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    Query(query): Query<ExpenseQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Page<Expense>> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let page = state
        .services
        .expenses
        .list_expenses(&user, salon_id, query, pagination.into())
        .await?;
    ok(page)
}

async fn create_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateExpenseRequest>,
) -> CreatedResult<Expense> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    debug!("Create expense request for salon {}", salon_id);

    let expense = state.services.expenses.create_expense(&user, salon_id, request).await?;
    created(expense)
}

async fn summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(salon_id): Path<String>,
    Query(query): Query<ExpenseQuery>,
) -> ApiResult<ExpenseSummary> {
    let salon_id: SalonId = parse_id("salon", &salon_id)?;
    let summary = state.services.expenses.summary(&user, salon_id, query).await?;
    ok(summary)
}

async fn get_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Expense> {
    let id: ExpenseId = parse_id("expense", &id)?;
    let expense = state.services.expenses.get_expense(&user, id).await?;
    ok(expense)
}

async fn update_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateExpenseRequest>,
) -> ApiResult<Expense> {
    let id: ExpenseId = parse_id("expense", &id)?;
    let expense = state.services.expenses.update_expense(&user, id, request).await?;
    ok(expense)
}

async fn delete_expense(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: ExpenseId = parse_id("expense", &id)?;
    state.services.expenses.delete_expense(&user, id).await?;
    Ok(no_content())
}
