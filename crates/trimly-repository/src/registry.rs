//! Repository wiring.

use crate::postgres::{
    PgAppointmentRepository, PgAttendanceRepository, PgCategoryRepository, PgCustomerRepository,
    PgExpenseRepository, PgInventoryRepository, PgOtpRepository, PgPlanRepository,
    PgSalonRepository, PgSalonServiceRepository, PgStaffRepository, PgUserRepository,
};
use crate::traits::{
    AppointmentRepository, AttendanceRepository, CategoryRepository, CustomerRepository,
    ExpenseRepository, InventoryRepository, OtpRepository, PlanRepository, SalonRepository,
    SalonServiceRepository, StaffRepository, UserRepository,
};
use crate::DatabasePoolInterface;
use std::sync::Arc;

/// Every repository the services depend on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub salons: Arc<dyn SalonRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub services: Arc<dyn SalonServiceRepository>,
    pub staff: Arc<dyn StaffRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub otp: Arc<dyn OtpRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub expenses: Arc<dyn ExpenseRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(Arc::clone(&pool))),
            plans: Arc::new(PgPlanRepository::new(Arc::clone(&pool))),
            salons: Arc::new(PgSalonRepository::new(Arc::clone(&pool))),
            categories: Arc::new(PgCategoryRepository::new(Arc::clone(&pool))),
            services: Arc::new(PgSalonServiceRepository::new(Arc::clone(&pool))),
            staff: Arc::new(PgStaffRepository::new(Arc::clone(&pool))),
            customers: Arc::new(PgCustomerRepository::new(Arc::clone(&pool))),
            otp: Arc::new(PgOtpRepository::new(Arc::clone(&pool))),
            appointments: Arc::new(PgAppointmentRepository::new(Arc::clone(&pool))),
            attendance: Arc::new(PgAttendanceRepository::new(Arc::clone(&pool))),
            inventory: Arc::new(PgInventoryRepository::new(Arc::clone(&pool))),
            expenses: Arc::new(PgExpenseRepository::new(pool)),
        }
    }

    /// Repositories over a fresh in-memory store.
    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    pub fn in_memory() -> Self {
        let db = Arc::new(crate::memory::InMemoryDatabase::new());
        Self {
            users: db.clone(),
            plans: db.clone(),
            salons: db.clone(),
            categories: db.clone(),
            services: db.clone(),
            staff: db.clone(),
            customers: db.clone(),
            otp: db.clone(),
            appointments: db.clone(),
            attendance: db.clone(),
            inventory: db.clone(),
            expenses: db,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
