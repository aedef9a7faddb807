//! Staff-side account entity and the subscription state embedded on tenants.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AccountStatus, Email, UserRole};
use crate::{AccessWindow, Plan, PlanId, SalonId, TenantId, UserId};

/// Subscription windows of a tenant. Only admin accounts carry meaningful
/// values; employees inherit their tenant's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan_id: Option<PlanId>,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub demo_ends_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// A fresh trial of `days` starting at `now`.
    #[must_use]
    pub fn trial(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            trial_ends_at: Some(now + Duration::days(days)),
            ..Self::default()
        }
    }

    /// Evaluates the access window at `now`.
    ///
    /// Windows are checked in the order paid, trial, demo; the first one still
    /// open wins.
    #[must_use]
    pub fn window_at(&self, now: DateTime<Utc>) -> AccessWindow {
        match (self.plan_id, self.plan_expires_at) {
            (Some(plan_id), Some(expires_at)) if expires_at > now => {
                return AccessWindow::Paid {
                    plan_id,
                    expires_at,
                }
            }
            _ => {}
        }
        if let Some(ends_at) = self.trial_ends_at.filter(|end| *end > now) {
            return AccessWindow::Trial { ends_at };
        }
        if let Some(ends_at) = self.demo_ends_at.filter(|end| *end > now) {
            return AccessWindow::Demo { ends_at };
        }
        AccessWindow::Expired
    }

    /// Activates `plan`.
    ///
    /// Renewing the plan that is already held extends from the later of now and
    /// the current expiry; switching plans starts a fresh term at now.
    pub fn subscribe(&mut self, plan: &Plan, now: DateTime<Utc>) {
        let term = Duration::days(i64::from(plan.duration_days));
        let starts_at = match (self.plan_id, self.plan_expires_at) {
            (Some(current), Some(expires_at)) if current == plan.id => expires_at.max(now),
            _ => now,
        };
        self.plan_id = Some(plan.id);
        self.plan_expires_at = Some(starts_at + term);
    }

    /// Opens a read-only demo window of `days` from now.
    pub fn grant_demo(&mut self, now: DateTime<Utc>, days: i64) {
        self.demo_ends_at = Some(now + Duration::days(days));
    }

    /// Extends the trial by `days` from the later of now and its current end.
    pub fn extend_trial(&mut self, now: DateTime<Utc>, days: i64) {
        let from = self.trial_ends_at.map_or(now, |end| end.max(now));
        self.trial_ends_at = Some(from + Duration::days(days));
    }
}

/// Staff-side account: super admin, tenant admin, manager, or staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Owning tenant; equal to `id` for admins, `None` for super admins.
    pub tenant_id: Option<TenantId>,

    /// Salon an employee is bound to.
    pub salon_id: Option<SalonId>,

    pub name: String,
    pub email: Email,
    pub phone: Option<String>,

    /// Hashed password (never exposed via API).
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,
    pub status: AccountStatus,
    pub subscription: Subscription,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    fn base(
        name: String,
        email: Email,
        password_hash: String,
        phone: Option<String>,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            tenant_id: None,
            salon_id: None,
            name,
            email,
            phone,
            password_hash,
            role,
            status: AccountStatus::Active,
            subscription: Subscription::default(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a tenant admin whose trial starts now.
    #[must_use]
    pub fn new_admin(
        name: String,
        email: Email,
        password_hash: String,
        phone: Option<String>,
        now: DateTime<Utc>,
        trial_days: i64,
    ) -> Self {
        let mut user = Self::base(name, email, password_hash, phone, UserRole::Admin, now);
        user.tenant_id = Some(user.id);
        user.subscription = Subscription::trial(now, trial_days);
        user
    }

    /// Creates a manager or staff account bound to a salon of `tenant_id`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new_employee(
        tenant_id: TenantId,
        salon_id: SalonId,
        role: UserRole,
        name: String,
        email: Email,
        password_hash: String,
        phone: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut user = Self::base(name, email, password_hash, phone, role, now);
        user.tenant_id = Some(tenant_id);
        user.salon_id = Some(salon_id);
        user
    }

    /// Creates a platform operator account.
    #[must_use]
    pub fn new_super_admin(name: String, email: Email, password_hash: String, now: DateTime<Utc>) -> Self {
        Self::base(name, email, password_hash, None, UserRole::SuperAdmin, now)
    }

    /// Checks if the user can log in.
    #[must_use]
    pub const fn can_login(&self) -> bool {
        self.status.can_login()
    }

    /// Records a successful login.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Updates the user's password hash.
    pub fn update_password(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.updated_at = now;
    }

    /// Changes the account status.
    pub fn set_status(&mut self, status: AccountStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}
