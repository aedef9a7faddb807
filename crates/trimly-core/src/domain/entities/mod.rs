//! Domain entities.

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

pub use appointment::{Appointment, CustomerDetails};
pub use attendance::Attendance;
pub use catalog::{Category, SalonService, SERVICE_DURATION_RANGE};
pub use customer::{Customer, OtpChallenge};
pub use expense::Expense;
pub use inventory::InventoryItem;
pub use plan::Plan;
pub use salon::{Salon, SalonSchedule, SLOT_INTERVAL_RANGE, UTC_OFFSET_RANGE};
pub use staff::Staff;
pub use user::{Subscription, User};
