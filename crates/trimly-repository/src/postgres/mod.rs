//! PostgreSQL repository implementations.

mod appointment;
mod attendance;
mod catalog;
mod customer;
mod expense;
mod inventory;
mod plan;
mod salon;
mod staff;
mod user;

pub use appointment::PgAppointmentRepository;
pub use attendance::PgAttendanceRepository;
pub use catalog::{PgCategoryRepository, PgSalonServiceRepository};
pub use customer::{PgCustomerRepository, PgOtpRepository};
pub use expense::PgExpenseRepository;
pub use inventory::PgInventoryRepository;
pub use plan::PgPlanRepository;
pub use salon::PgSalonRepository;
pub use staff::PgStaffRepository;
pub use user::PgUserRepository;

use std::str::FromStr;
use trimly_core::{TrimlyError, TrimlyResult};

/// Parses a text column into a domain enum.
pub(crate) fn parse_column<T: FromStr>(value: &str, column: &str) -> TrimlyResult<T> {
    value
        .parse()
        .map_err(|_| TrimlyError::Internal(format!("Invalid {} in database: {}", column, value)))
}

/// Converts a page request into `LIMIT`/`OFFSET` binds, clamping to `i64::MAX`.
pub(crate) fn limit_offset(page: trimly_core::PageRequest) -> (i64, i64) {
    let bind = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
    (bind(page.limit()), bind(page.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimly_core::PageRequest;

    #[test]
    fn test_limit_offset_never_goes_negative() {
        assert_eq!(limit_offset(PageRequest::new(2, 10)), (10, 20));
        assert_eq!(limit_offset(PageRequest::new(usize::MAX, 20)), (20, i64::MAX));
    }
}
