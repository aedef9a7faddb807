//! User-related DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trimly_core::rules::{not_blank, password_complexity, phone_number};
use trimly_core::{AccountStatus, SalonId, TenantId, User, UserId, UserRole};
use validator::Validate;

/// Account as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub salon_id: Option<SalonId>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: AccountStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            salon_id: user.salon_id,
            name: user.name,
            email: user.email.into(),
            phone: user.phone,
            role: user.role,
            status: user.status,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Manager or staff account created by an admin or manager.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    pub salon_id: SalonId,

    pub role: UserRole,

    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(custom(function = "password_complexity"))]
    pub password: String,

    #[validate(custom(function = "phone_number"))]
    pub phone: Option<String>,
}

/// Profile fields an employee record may change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(custom(function = "phone_number"))]
    pub phone: Option<String>,
}

/// Suspend or reactivate an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: AccountStatus,
}

/// Employee list filter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EmployeeQuery {
    pub salon_id: Option<SalonId>,
}
