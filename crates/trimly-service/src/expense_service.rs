//! Salon expense ledger.

use crate::dto::{CategoryTotal, CreateExpenseRequest, ExpenseQuery, ExpenseSummary, UpdateExpenseRequest};
use crate::scope;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{
    Clock, Expense, ExpenseId, Interface, Page, PageRequest, Permission, SalonId, TrimlyError, TrimlyResult,
    ValidateExt,
};
use trimly_repository::{ExpenseFilter, Repositories};
use trimly_security::{Claims, ClaimsExt};

/// Expense service trait.
#[async_trait]
pub trait ExpenseService: Interface + Send + Sync {
    async fn create_expense(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateExpenseRequest,
    ) -> TrimlyResult<Expense>;

    async fn get_expense(&self, claims: &Claims, id: ExpenseId) -> TrimlyResult<Expense>;

    async fn list_expenses(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        query: ExpenseQuery,
        page: PageRequest,
    ) -> TrimlyResult<Page<Expense>>;

    async fn update_expense(
        &self,
        claims: &Claims,
        id: ExpenseId,
        request: UpdateExpenseRequest,
    ) -> TrimlyResult<Expense>;

    async fn delete_expense(&self, claims: &Claims, id: ExpenseId) -> TrimlyResult<()>;

    /// Total and per-category totals over an inclusive date range.
    async fn summary(&self, claims: &Claims, salon_id: SalonId, query: ExpenseQuery) -> TrimlyResult<ExpenseSummary>;
}

/// Expense service implementation.
pub struct ExpenseServiceImpl {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl ExpenseServiceImpl {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    async fn expense_for(&self, claims: &Claims, id: ExpenseId) -> TrimlyResult<Expense> {
        claims.require_permission(Permission::ExpenseManage)?;
        let expense = self
            .repos
            .expenses
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Expense", id))?;
        scope::salon_for(&self.repos, claims, expense.salon_id).await?;
        Ok(expense)
    }

    async fn filter_for(&self, claims: &Claims, salon_id: SalonId, query: ExpenseQuery) -> TrimlyResult<ExpenseFilter> {
        claims.require_permission(Permission::ExpenseManage)?;
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(TrimlyError::validation("from must not be after to"));
            }
        }
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        Ok(ExpenseFilter {
            salon_id: salon.id,
            from: query.from,
            to: query.to,
            category: query.category,
        })
    }
}

fn check_amount(amount: Decimal) -> TrimlyResult<()> {
    if amount <= Decimal::ZERO {
        return Err(TrimlyError::validation("amount: must be greater than zero"));
    }
    Ok(())
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    async fn create_expense(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: CreateExpenseRequest,
    ) -> TrimlyResult<Expense> {
        debug!("Recording {} expense of {} for salon {}", request.category, request.amount, salon_id);
        claims.require_permission(Permission::ExpenseManage)?;
        request.validate_request()?;
        check_amount(request.amount)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;

        let mut expense = Expense::new(
            salon.id,
            request.category,
            request.amount,
            request.expense_date,
            request.payment_method,
            self.clock.now(),
        );
        expense.description = request.description;
        expense.created_by = claims.user_id();

        let saved = self.repos.expenses.save(&expense).await?;
        info!("Expense {} recorded for salon {}", saved.id, salon.id);
        Ok(saved)
    }

    async fn get_expense(&self, claims: &Claims, id: ExpenseId) -> TrimlyResult<Expense> {
        self.expense_for(claims, id).await
    }

    async fn list_expenses(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        query: ExpenseQuery,
        page: PageRequest,
    ) -> TrimlyResult<Page<Expense>> {
        let filter = self.filter_for(claims, salon_id, query).await?;
        self.repos.expenses.find_filtered(filter, page).await
    }

    async fn update_expense(
        &self,
        claims: &Claims,
        id: ExpenseId,
        request: UpdateExpenseRequest,
    ) -> TrimlyResult<Expense> {
        request.validate_request()?;
        let mut expense = self.expense_for(claims, id).await?;

        if let Some(category) = request.category {
            expense.category = category;
        }
        if let Some(amount) = request.amount {
            check_amount(amount)?;
            expense.amount = amount;
        }
        if let Some(date) = request.expense_date {
            expense.expense_date = date;
        }
        if let Some(description) = request.description {
            expense.description = Some(description);
        }
        if let Some(method) = request.payment_method {
            expense.payment_method = method;
        }
        expense.updated_at = self.clock.now();

        let updated = self.repos.expenses.update(&expense).await?;
        info!("Expense {} updated", updated.id);
        Ok(updated)
    }

    async fn delete_expense(&self, claims: &Claims, id: ExpenseId) -> TrimlyResult<()> {
        let expense = self.expense_for(claims, id).await?;
        if !self.repos.expenses.delete(expense.id).await? {
            return Err(TrimlyError::not_found("Expense", id));
        }
        info!("Expense {} deleted", id);
        Ok(())
    }

    async fn summary(&self, claims: &Claims, salon_id: SalonId, query: ExpenseQuery) -> TrimlyResult<ExpenseSummary> {
        let filter = self.filter_for(claims, salon_id, query).await?;
        let totals = self.repos.expenses.totals_by_category(filter).await?;

        let by_category: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect();
        Ok(ExpenseSummary {
            from: query.from,
            to: query.to,
            total: by_category.iter().map(|c| c.total).sum(),
            by_category,
        })
    }
}

impl std::fmt::Debug for ExpenseServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use trimly_core::{ExpenseCategory, PaymentMethod, UserRole};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn expense(category: ExpenseCategory, amount: Decimal, date: NaiveDate) -> CreateExpenseRequest {
        CreateExpenseRequest {
            category,
            amount,
            expense_date: date,
            description: None,
            payment_method: PaymentMethod::BankTransfer,
        }
    }

    #[tokio::test]
    async fn test_amount_must_be_positive() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        for amount in [dec!(0), dec!(-10)] {
            let err = ctx
                .services
                .expenses
                .create_expense(&admin, salon.id, expense(ExpenseCategory::Rent, amount, day(1)))
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
    }

    #[tokio::test]
    async fn test_summary_over_range() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let expenses = &ctx.services.expenses;
        for (category, amount, date) in [
            (ExpenseCategory::Rent, dec!(1200), day(1)),
            (ExpenseCategory::Supplies, dec!(80.25), day(4)),
            (ExpenseCategory::Supplies, dec!(19.75), day(9)),
            (ExpenseCategory::Utilities, dec!(150), day(28)),
        ] {
            expenses
                .create_expense(&admin, salon.id, expense(category, amount, date))
                .await
                .unwrap();
        }

        let query = ExpenseQuery {
            from: Some(day(1)),
            to: Some(day(10)),
            category: None,
        };
        let summary = expenses.summary(&admin, salon.id, query).await.unwrap();
        assert_eq!(summary.total, dec!(1300));
        let supplies = summary
            .by_category
            .iter()
            .find(|c| c.category == ExpenseCategory::Supplies)
            .unwrap();
        assert_eq!(supplies.total, dec!(100));
        assert!(summary.by_category.iter().all(|c| c.category != ExpenseCategory::Utilities));

        let page = expenses
            .list_expenses(
                &admin,
                salon.id,
                ExpenseQuery {
                    category: Some(ExpenseCategory::Supplies),
                    ..ExpenseQuery::default()
                },
                PageRequest::first(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_elements(), 2);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let query = ExpenseQuery {
            from: Some(day(10)),
            to: Some(day(1)),
            category: None,
        };
        let err = ctx.services.expenses.summary(&admin, salon.id, query).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_see_expense() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, rival) = ctx.admin("rival@cuts.example").await;
        let recorded = ctx
            .services
            .expenses
            .create_expense(&admin, salon.id, expense(ExpenseCategory::Rent, dec!(900), day(1)))
            .await
            .unwrap();
        assert_eq!(recorded.created_by, admin.user_id());

        let err = ctx.services.expenses.get_expense(&rival, recorded.id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_update_delete_and_staff_denied() {
        let ctx = TestContext::new();
        let (_, admin) = ctx.admin("asha@glow.example").await;
        let salon = ctx.salon(&admin).await;
        let (_, staff) = ctx.employee(&admin, &salon, UserRole::Staff, "ravi@glow.example").await;
        let expenses = &ctx.services.expenses;
        let recorded = expenses
            .create_expense(&admin, salon.id, expense(ExpenseCategory::Marketing, dec!(40), day(2)))
            .await
            .unwrap();

        let updated = expenses
            .update_expense(
                &admin,
                recorded.id,
                UpdateExpenseRequest {
                    amount: Some(dec!(45)),
                    payment_method: Some(PaymentMethod::Upi),
                    ..UpdateExpenseRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, dec!(45));
        assert_eq!(updated.payment_method, PaymentMethod::Upi);

        assert_eq!(
            expenses.get_expense(&staff, recorded.id).await.unwrap_err().status_code(),
            403
        );
        expenses.delete_expense(&admin, recorded.id).await.unwrap();
        assert_eq!(
            expenses.get_expense(&admin, recorded.id).await.unwrap_err().status_code(),
            404
        );
    }
}
