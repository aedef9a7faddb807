//! Repository trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use trimly_core::{
    Appointment, AppointmentId, AppointmentStatus, Attendance, AttendanceId, Category, CategoryId,
    Customer, CustomerId, Expense, ExpenseCategory, ExpenseId, Interface, InventoryItem,
    InventoryItemId, OtpChallenge, Page, PageRequest, Plan, PlanId, Salon, SalonId, SalonService,
    ServiceId, Staff, StaffId, TenantId, TrimlyResult, User, UserId,
};

/// Staff-side account repository.
#[async_trait]
pub trait UserRepository: Interface + Send + Sync {
    /// Finds a user by ID. Soft-deleted users are not returned.
    async fn find_by_id(&self, id: UserId) -> TrimlyResult<Option<User>>;

    /// Finds a user by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> TrimlyResult<Option<User>>;

    /// Checks if an email is taken by a live account.
    async fn exists_by_email(&self, email: &str) -> TrimlyResult<bool>;

    /// Lists manager and staff accounts of a tenant, optionally limited to
    /// one salon.
    async fn find_employees(
        &self,
        tenant_id: TenantId,
        salon_id: Option<SalonId>,
        page: PageRequest,
    ) -> TrimlyResult<Page<User>>;

    /// Saves a new user.
    async fn save(&self, user: &User) -> TrimlyResult<User>;

    /// Updates an existing user.
    async fn update(&self, user: &User) -> TrimlyResult<User>;

    /// Soft-deletes a user.
    async fn delete(&self, id: UserId) -> TrimlyResult<bool>;
}

/// Subscription plan repository.
#[async_trait]
pub trait PlanRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: PlanId) -> TrimlyResult<Option<Plan>>;

    async fn find_by_name(&self, name: &str) -> TrimlyResult<Option<Plan>>;

    /// Lists plans ordered by price, optionally only the active ones.
    async fn find_all(&self, active_only: bool) -> TrimlyResult<Vec<Plan>>;

    async fn save(&self, plan: &Plan) -> TrimlyResult<Plan>;

    async fn update(&self, plan: &Plan) -> TrimlyResult<Plan>;
}

/// Salon repository.
#[async_trait]
pub trait SalonRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: SalonId) -> TrimlyResult<Option<Salon>>;

    /// Lists salons of one owner.
    async fn find_by_owner(&self, owner_id: TenantId, page: PageRequest) -> TrimlyResult<Page<Salon>>;

    /// Lists every salon on the platform.
    async fn find_all(&self, page: PageRequest) -> TrimlyResult<Page<Salon>>;

    async fn count_by_owner(&self, owner_id: TenantId) -> TrimlyResult<u64>;

    async fn save(&self, salon: &Salon) -> TrimlyResult<Salon>;

    async fn update(&self, salon: &Salon) -> TrimlyResult<Salon>;

    /// Deletes a salon together with everything that belongs to it.
    async fn delete(&self, id: SalonId) -> TrimlyResult<bool>;
}

/// Service category repository.
#[async_trait]
pub trait CategoryRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: CategoryId) -> TrimlyResult<Option<Category>>;

    /// Finds a category of a salon by name, case-insensitively.
    async fn find_by_name(&self, salon_id: SalonId, name: &str) -> TrimlyResult<Option<Category>>;

    async fn find_by_salon(&self, salon_id: SalonId) -> TrimlyResult<Vec<Category>>;

    async fn save(&self, category: &Category) -> TrimlyResult<Category>;

    async fn update(&self, category: &Category) -> TrimlyResult<Category>;

    /// Deletes a category. Its services become uncategorised.
    async fn delete(&self, id: CategoryId) -> TrimlyResult<bool>;
}

/// Filter for listing the services of a salon.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceFilter {
    pub category_id: Option<CategoryId>,
    pub active: Option<bool>,
}

/// Salon service repository.
///
/// Returned services carry `staff_ids` loaded from the assignment relation.
#[async_trait]
pub trait SalonServiceRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: ServiceId) -> TrimlyResult<Option<SalonService>>;

    /// Finds every service among `ids` that exists. Order is unspecified.
    async fn find_by_ids(&self, ids: &[ServiceId]) -> TrimlyResult<Vec<SalonService>>;

    async fn find_by_salon(&self, salon_id: SalonId, filter: ServiceFilter) -> TrimlyResult<Vec<SalonService>>;

    async fn save(&self, service: &SalonService) -> TrimlyResult<SalonService>;

    /// Updates service fields. Assignments are left untouched.
    async fn update(&self, service: &SalonService) -> TrimlyResult<SalonService>;

    /// Deletes a service and its staff assignments.
    async fn delete(&self, id: ServiceId) -> TrimlyResult<bool>;

    /// Replaces the staff assigned to a service.
    async fn replace_staff(&self, id: ServiceId, staff_ids: &[StaffId]) -> TrimlyResult<()>;
}

/// Staff repository.
///
/// Returned staff carry `service_ids` loaded from the assignment relation.
#[async_trait]
pub trait StaffRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: StaffId) -> TrimlyResult<Option<Staff>>;

    async fn find_by_ids(&self, ids: &[StaffId]) -> TrimlyResult<Vec<Staff>>;

    /// Finds the staff record linked to a login account.
    async fn find_by_user(&self, user_id: UserId) -> TrimlyResult<Option<Staff>>;

    async fn find_by_salon(&self, salon_id: SalonId, active: Option<bool>) -> TrimlyResult<Vec<Staff>>;

    /// Counts active staff of a salon.
    async fn count_active(&self, salon_id: SalonId) -> TrimlyResult<u64>;

    async fn save(&self, staff: &Staff) -> TrimlyResult<Staff>;

    /// Updates staff fields. Assignments are left untouched.
    async fn update(&self, staff: &Staff) -> TrimlyResult<Staff>;

    async fn delete(&self, id: StaffId) -> TrimlyResult<bool>;

    /// Replaces the services a staff member performs.
    async fn replace_services(&self, id: StaffId, service_ids: &[ServiceId]) -> TrimlyResult<()>;
}

/// Customer repository.
#[async_trait]
pub trait CustomerRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: CustomerId) -> TrimlyResult<Option<Customer>>;

    /// Finds a customer by normalised phone number.
    async fn find_by_phone(&self, phone: &str) -> TrimlyResult<Option<Customer>>;

    async fn save(&self, customer: &Customer) -> TrimlyResult<Customer>;

    async fn update(&self, customer: &Customer) -> TrimlyResult<Customer>;
}

/// Pending OTP challenges, one per phone.
#[async_trait]
pub trait OtpRepository: Interface + Send + Sync {
    async fn find(&self, phone: &str) -> TrimlyResult<Option<OtpChallenge>>;

    /// Stores a challenge, replacing any previous one for the phone.
    async fn upsert(&self, challenge: &OtpChallenge) -> TrimlyResult<()>;

    /// Counts one verification attempt against a live challenge and returns it.
    ///
    /// Returns `None` without counting when the challenge is missing, expired at
    /// `now`, or already has `max_attempts` attempts. The check and the
    /// increment are a single atomic step.
    async fn consume_attempt(
        &self,
        phone: &str,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> TrimlyResult<Option<OtpChallenge>>;

    async fn delete(&self, phone: &str) -> TrimlyResult<bool>;
}

/// Filter for listing appointments of a salon.
#[derive(Debug, Clone, Copy)]
pub struct AppointmentFilter {
    pub salon_id: SalonId,
    pub date: Option<NaiveDate>,
    pub staff_id: Option<StaffId>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    #[must_use]
    pub const fn for_salon(salon_id: SalonId) -> Self {
        Self {
            salon_id,
            date: None,
            staff_id: None,
            status: None,
        }
    }
}

/// Appointment repository.
#[async_trait]
pub trait AppointmentRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: AppointmentId) -> TrimlyResult<Option<Appointment>>;

    /// Every appointment of a salon on a date, all statuses, ordered by start.
    async fn find_by_salon_on(&self, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Appointment>>;

    /// Every appointment of a staff member on a date, all statuses.
    async fn find_by_staff_on(&self, staff_id: StaffId, date: NaiveDate) -> TrimlyResult<Vec<Appointment>>;

    /// Lists appointments ordered by date and start time.
    async fn find_filtered(&self, filter: AppointmentFilter, page: PageRequest) -> TrimlyResult<Page<Appointment>>;

    /// Lists a customer's appointments, newest first.
    async fn find_by_customer(&self, customer_id: CustomerId, page: PageRequest) -> TrimlyResult<Page<Appointment>>;

    /// Counts booked or confirmed appointments dated `from` or later, for a
    /// salon and optionally only one of its staff members.
    async fn count_upcoming(&self, salon_id: SalonId, staff_id: Option<StaffId>, from: NaiveDate) -> TrimlyResult<u64>;

    async fn save(&self, appointment: &Appointment) -> TrimlyResult<Appointment>;

    async fn update(&self, appointment: &Appointment) -> TrimlyResult<Appointment>;
}

/// Attendance repository.
#[async_trait]
pub trait AttendanceRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: AttendanceId) -> TrimlyResult<Option<Attendance>>;

    async fn find_by_staff_on(&self, staff_id: StaffId, date: NaiveDate) -> TrimlyResult<Option<Attendance>>;

    async fn find_by_salon_on(&self, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Attendance>>;

    /// Records of a staff member with `from <= date <= to`.
    async fn find_by_staff_between(
        &self,
        staff_id: StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TrimlyResult<Vec<Attendance>>;

    async fn save(&self, attendance: &Attendance) -> TrimlyResult<Attendance>;

    async fn update(&self, attendance: &Attendance) -> TrimlyResult<Attendance>;
}

/// Inventory repository.
#[async_trait]
pub trait InventoryRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: InventoryItemId) -> TrimlyResult<Option<InventoryItem>>;

    /// Finds an item by SKU within a salon, case-insensitively.
    async fn find_by_sku(&self, salon_id: SalonId, sku: &str) -> TrimlyResult<Option<InventoryItem>>;

    async fn find_by_salon(&self, salon_id: SalonId, page: PageRequest) -> TrimlyResult<Page<InventoryItem>>;

    /// Items at or below their reorder level.
    async fn find_low_stock(&self, salon_id: SalonId) -> TrimlyResult<Vec<InventoryItem>>;

    async fn save(&self, item: &InventoryItem) -> TrimlyResult<InventoryItem>;

    /// Writes the descriptive fields. The stored quantity is left alone; it
    /// only moves through `adjust_quantity`.
    async fn update(&self, item: &InventoryItem) -> TrimlyResult<InventoryItem>;

    /// Adds `delta` to the stored quantity in one atomic step. Returns `None`
    /// when the item is missing or the quantity would drop below zero.
    async fn adjust_quantity(
        &self,
        id: InventoryItemId,
        delta: i32,
        now: DateTime<Utc>,
    ) -> TrimlyResult<Option<InventoryItem>>;

    async fn delete(&self, id: InventoryItemId) -> TrimlyResult<bool>;
}

/// Filter for listing expenses of a salon. Date bounds are inclusive.
#[derive(Debug, Clone, Copy)]
pub struct ExpenseFilter {
    pub salon_id: SalonId,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<ExpenseCategory>,
}

impl ExpenseFilter {
    #[must_use]
    pub const fn for_salon(salon_id: SalonId) -> Self {
        Self {
            salon_id,
            from: None,
            to: None,
            category: None,
        }
    }
}

/// Expense repository.
#[async_trait]
pub trait ExpenseRepository: Interface + Send + Sync {
    async fn find_by_id(&self, id: ExpenseId) -> TrimlyResult<Option<Expense>>;

    /// Lists expenses, newest first.
    async fn find_filtered(&self, filter: ExpenseFilter, page: PageRequest) -> TrimlyResult<Page<Expense>>;

    /// Sums amounts per category for the filter. Categories without
    /// expenses are omitted.
    async fn totals_by_category(&self, filter: ExpenseFilter) -> TrimlyResult<Vec<(ExpenseCategory, Decimal)>>;

    async fn save(&self, expense: &Expense) -> TrimlyResult<Expense>;

    async fn update(&self, expense: &Expense) -> TrimlyResult<Expense>;

    async fn delete(&self, id: ExpenseId) -> TrimlyResult<bool>;
}
