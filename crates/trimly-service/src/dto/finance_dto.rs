//! Attendance, inventory, and expense DTOs.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trimly_core::rules::not_blank;
use trimly_core::{AttendanceStatus, ExpenseCategory, PaymentMethod, StaffId};
use validator::Validate;

// ============ Attendance ============

/// Manager's upsert of a staff member's day.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MarkAttendanceRequest {
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Check-in or check-out. Staff omit `staff_id`; managers may set it.
/// `time` defaults to the salon-local current time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClockRequest {
    pub staff_id: Option<StaffId>,
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttendanceDayQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

/// Per-status day counts and worked time for one staff member in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub staff_id: StaffId,
    pub year: i32,
    pub month: u32,
    pub present: u32,
    pub absent: u32,
    pub half_day: u32,
    pub leave: u32,
    pub worked_minutes: i64,
}

// ============ Inventory ============

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInventoryItemRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: String,

    #[validate(length(min = 1, max = 60), custom(function = "not_blank"))]
    pub sku: String,

    #[validate(length(min = 1, max = 30), custom(function = "not_blank"))]
    pub unit: String,

    #[validate(range(min = 0))]
    pub quantity: i32,

    #[validate(range(min = 0))]
    pub reorder_level: i32,

    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateInventoryItemRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 60), custom(function = "not_blank"))]
    pub sku: Option<String>,

    #[validate(length(min = 1, max = 30), custom(function = "not_blank"))]
    pub unit: Option<String>,

    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,

    pub unit_cost: Option<Decimal>,
}

/// Stock movement: positive receives stock, negative consumes it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdjustStockRequest {
    pub delta: i32,

    #[validate(length(max = 300))]
    pub reason: Option<String>,
}

// ============ Expenses ============

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub expense_date: NaiveDate,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateExpenseRequest {
    pub category: Option<ExpenseCategory>,
    pub amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExpenseQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<ExpenseCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub total: Decimal,
    pub by_category: Vec<CategoryTotal>,
}
