//! Salon expense ledger entry.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ExpenseCategory, PaymentMethod};
use crate::{ExpenseId, SalonId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub salon_id: SalonId,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub description: Option<String>,
    pub payment_method: PaymentMethod,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    #[must_use]
    pub fn new(
        salon_id: SalonId,
        category: ExpenseCategory,
        amount: Decimal,
        expense_date: NaiveDate,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExpenseId::new(),
            salon_id,
            category,
            amount,
            expense_date,
            description: None,
            payment_method,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}
