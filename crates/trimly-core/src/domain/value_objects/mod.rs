//! Value objects.

mod email;
mod role;
mod status;
mod time_slot;
mod weekdays;

pub use email::Email;
pub use role::{Permission, UserRole};
pub use status::{
    AccountStatus, AppointmentKind, AppointmentStatus, AttendanceStatus, ExpenseCategory,
    PaymentMethod,
};
pub use time_slot::TimeSlot;
pub use weekdays::WeekdaySet;
