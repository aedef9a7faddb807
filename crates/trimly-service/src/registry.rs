//! Wiring of every service over one set of repositories.

use crate::access_service::{AccessService, AccessServiceImpl};
use crate::appointment_service::{AppointmentService, AppointmentServiceImpl};
use crate::attendance_service::{AttendanceService, AttendanceServiceImpl};
use crate::auth_service::{AuthService, AuthServiceImpl};
use crate::catalog_service::{CatalogService, CatalogServiceImpl};
use crate::customer_service::{CustomerService, CustomerServiceImpl};
use crate::expense_service::{ExpenseService, ExpenseServiceImpl};
use crate::inventory_service::{InventoryService, InventoryServiceImpl};
use crate::otp_sender::OtpSender;
use crate::plan_service::{PlanService, PlanServiceImpl};
use crate::salon_service::{SalonManagementService, SalonManagementServiceImpl};
use crate::staff_service::{StaffService, StaffServiceImpl};
use crate::subscription_service::{SubscriptionService, SubscriptionServiceImpl};
use crate::user_service::{UserService, UserServiceImpl};
use std::sync::Arc;
use trimly_config::AppConfig;
use trimly_core::Clock;
use trimly_repository::Repositories;
use trimly_security::{PasswordHasher, TokenProvider};

/// Every business service, shared behind `Arc`s.
#[derive(Clone)]
pub struct Services {
    pub access: Arc<dyn AccessService>,
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UserService>,
    pub customers: Arc<dyn CustomerService>,
    pub plans: Arc<dyn PlanService>,
    pub subscriptions: Arc<dyn SubscriptionService>,
    pub salons: Arc<dyn SalonManagementService>,
    pub staff: Arc<dyn StaffService>,
    pub catalog: Arc<dyn CatalogService>,
    pub appointments: Arc<dyn AppointmentService>,
    pub attendance: Arc<dyn AttendanceService>,
    pub inventory: Arc<dyn InventoryService>,
    pub expenses: Arc<dyn ExpenseService>,
    pub token_provider: Arc<TokenProvider>,
}

impl Services {
    /// Builds the services. The access service is shared by everything that
    /// enforces plan limits, so its cache is one per process.
    pub fn new(
        repos: Repositories,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        otp_sender: Arc<dyn OtpSender>,
        hasher: PasswordHasher,
    ) -> Self {
        let hasher = Arc::new(hasher);
        let token_provider = Arc::new(TokenProvider::new(Arc::new(config.security.clone())));

        let access: Arc<dyn AccessService> = Arc::new(AccessServiceImpl::new(
            &repos,
            config.subscription.clone(),
            Arc::clone(&clock),
        ));

        Self {
            auth: Arc::new(AuthServiceImpl::new(
                Arc::clone(&repos.users),
                Arc::clone(&hasher),
                Arc::clone(&token_provider),
                Arc::clone(&clock),
                config.subscription.trial_days,
            )),
            users: Arc::new(UserServiceImpl::new(repos.clone(), Arc::clone(&hasher), Arc::clone(&clock))),
            customers: Arc::new(CustomerServiceImpl::new(
                &repos,
                Arc::clone(&hasher),
                Arc::clone(&token_provider),
                otp_sender,
                config.otp.clone(),
                Arc::clone(&clock),
            )),
            plans: Arc::new(PlanServiceImpl::new(Arc::clone(&repos.plans), Arc::clone(&clock))),
            subscriptions: Arc::new(SubscriptionServiceImpl::new(
                repos.clone(),
                Arc::clone(&access),
                Arc::clone(&clock),
            )),
            salons: Arc::new(SalonManagementServiceImpl::new(
                repos.clone(),
                Arc::clone(&access),
                Arc::clone(&clock),
                config.booking.default_slot_interval_minutes,
            )),
            staff: Arc::new(StaffServiceImpl::new(repos.clone(), Arc::clone(&access), Arc::clone(&clock))),
            catalog: Arc::new(CatalogServiceImpl::new(repos.clone(), Arc::clone(&clock))),
            appointments: Arc::new(AppointmentServiceImpl::new(
                repos.clone(),
                config.booking.clone(),
                Arc::clone(&clock),
            )),
            attendance: Arc::new(AttendanceServiceImpl::new(repos.clone(), Arc::clone(&clock))),
            inventory: Arc::new(InventoryServiceImpl::new(repos.clone(), Arc::clone(&clock))),
            expenses: Arc::new(ExpenseServiceImpl::new(repos, clock)),
            access,
            token_provider,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
