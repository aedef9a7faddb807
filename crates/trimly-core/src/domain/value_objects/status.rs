//! Status and category enumerations.
//!
//! Every enum here is stored as its snake_case name in the database and on the
//! wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TrimlyError;

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Returns the stored name.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// All values in declaration order.
            #[must_use]
            pub const fn all() -> &'static [Self] {
                &[$(Self::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TrimlyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(TrimlyError::validation(format!(
                        concat!("Unknown ", $label, ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

named_enum!(
    /// Account lifecycle. Only active accounts may log in.
    AccountStatus, "account status" {
        Active => "active",
        Suspended => "suspended",
        /// Soft-deleted.
        Deleted => "deleted",
    }
);

impl AccountStatus {
    /// Checks if the account may log in.
    #[must_use]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }
}

named_enum!(
    /// Appointment lifecycle.
    AppointmentStatus, "appointment status" {
        Booked => "booked",
        Confirmed => "confirmed",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
);

impl AppointmentStatus {
    /// Checks whether moving to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Booked,
                Self::Confirmed | Self::InProgress | Self::Cancelled | Self::NoShow
            ) | (
                Self::Confirmed,
                Self::InProgress | Self::Cancelled | Self::NoShow
            ) | (Self::InProgress, Self::Completed)
        )
    }

    /// Terminal states accept no further transition.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether an appointment in this state occupies its staff member's time.
    #[must_use]
    pub const fn blocks_slot(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::NoShow)
    }

    /// Whether the appointment may still be moved or cancelled by its owner.
    #[must_use]
    pub const fn is_upcoming(&self) -> bool {
        matches!(self, Self::Booked | Self::Confirmed)
    }
}

named_enum!(
    /// How an appointment entered the book.
    AppointmentKind, "appointment kind" {
        Scheduled => "scheduled",
        WalkIn => "walk_in",
    }
);

named_enum!(
    /// Daily attendance outcome.
    AttendanceStatus, "attendance status" {
        Present => "present",
        Absent => "absent",
        HalfDay => "half_day",
        Leave => "leave",
    }
);

impl AttendanceStatus {
    /// Staff with this status cannot take bookings that day.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Absent | Self::Leave)
    }
}

named_enum!(
    /// Expense bucket.
    ExpenseCategory, "expense category" {
        Rent => "rent",
        Salary => "salary",
        Supplies => "supplies",
        Utilities => "utilities",
        Marketing => "marketing",
        Maintenance => "maintenance",
        Other => "other",
    }
);

named_enum!(
    /// How an expense was paid.
    PaymentMethod, "payment method" {
        Cash => "cash",
        Card => "card",
        BankTransfer => "bank_transfer",
        Upi => "upi",
        Other => "other",
    }
);
