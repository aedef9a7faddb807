//! Typed ID wrappers for domain entities.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new time-ordered ID.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from a UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parses an ID from a string.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(
    /// Identifier of a staff-side account (super admin, admin, manager, staff).
    UserId
);
typed_id!(
    /// Identifier of a subscription plan.
    PlanId
);
typed_id!(
    /// Identifier of a salon (branch).
    SalonId
);
typed_id!(
    /// Identifier of a staff roster entry.
    StaffId
);
typed_id!(
    /// Identifier of a service category.
    CategoryId
);
typed_id!(
    /// Identifier of a bookable salon service.
    ServiceId
);
typed_id!(
    /// Identifier of a customer.
    CustomerId
);
typed_id!(
    /// Identifier of an appointment.
    AppointmentId
);
typed_id!(
    /// Identifier of an attendance record.
    AttendanceId
);
typed_id!(
    /// Identifier of an inventory item.
    InventoryItemId
);
typed_id!(
    /// Identifier of an expense entry.
    ExpenseId
);

/// Tenants are admin accounts, so a tenant is addressed by its admin's user id.
pub type TenantId = UserId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id1 = SalonId::new();
        let id2 = SalonId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = AppointmentId::new();
        let second = AppointmentId::new();
        assert!(first < second);
    }

    #[test]
    fn test_id_parsing() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = StaffId::parse(uuid_str).unwrap();
        assert_eq!(id.to_string(), uuid_str);

        let from_str: StaffId = uuid_str.parse().unwrap();
        assert_eq!(id, from_str);
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(UserId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = ServiceId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
    }
}
