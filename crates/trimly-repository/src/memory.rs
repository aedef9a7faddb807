//! In-memory repositories.
//!
//! One [`InMemoryDatabase`] implements every repository trait over a single
//! lock, so cascades and the staff/service relation behave like the
//! PostgreSQL schema. Used by service and REST tests.

use crate::traits::{
    AppointmentFilter, AppointmentRepository, AttendanceRepository, CategoryRepository,
    CustomerRepository, ExpenseFilter, ExpenseRepository, InventoryRepository, OtpRepository,
    PlanRepository, SalonRepository, SalonServiceRepository, ServiceFilter, StaffRepository,
    UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use trimly_core::{
    AccountStatus, Appointment, AppointmentId, Attendance, AttendanceId, Category, CategoryId,
    Customer, CustomerId, Expense, ExpenseCategory, ExpenseId, InventoryItem, InventoryItemId,
    OtpChallenge, Page, PageRequest, Plan, PlanId, Salon, SalonId, SalonService, ServiceId, Staff,
    StaffId, TenantId, TrimlyError, TrimlyResult, User, UserId, UserRole,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    plans: HashMap<PlanId, Plan>,
    salons: HashMap<SalonId, Salon>,
    categories: HashMap<CategoryId, Category>,
    services: HashMap<ServiceId, SalonService>,
    staff: HashMap<StaffId, Staff>,
    assignments: BTreeSet<(StaffId, ServiceId)>,
    customers: HashMap<CustomerId, Customer>,
    otp: HashMap<String, OtpChallenge>,
    appointments: HashMap<AppointmentId, Appointment>,
    attendance: HashMap<AttendanceId, Attendance>,
    inventory: HashMap<InventoryItemId, InventoryItem>,
    expenses: HashMap<ExpenseId, Expense>,
}

impl Tables {
    fn with_staff_ids(&self, mut service: SalonService) -> SalonService {
        service.staff_ids = self
            .assignments
            .iter()
            .filter(|(_, svc)| *svc == service.id)
            .map(|(staff, _)| *staff)
            .collect();
        service.staff_ids.sort();
        service
    }

    fn with_service_ids(&self, mut staff: Staff) -> Staff {
        staff.service_ids = self
            .assignments
            .range((staff.id, ServiceId::from_uuid(uuid::Uuid::nil()))..)
            .take_while(|(st, _)| *st == staff.id)
            .map(|(_, svc)| *svc)
            .collect();
        staff
    }

    fn live_email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users.values().any(|u| {
            u.status != AccountStatus::Deleted
                && Some(u.id) != except
                && u.email.as_str().eq_ignore_ascii_case(email)
        })
    }

    fn remove_staff(&mut self, id: StaffId) -> bool {
        let removed = self.staff.remove(&id).is_some();
        self.assignments.retain(|(staff, _)| *staff != id);
        self.appointments.retain(|_, a| a.staff_id != id);
        self.attendance.retain(|_, a| a.staff_id != id);
        removed
    }

    fn remove_service(&mut self, id: ServiceId) -> bool {
        let removed = self.services.remove(&id).is_some();
        self.assignments.retain(|(_, svc)| *svc != id);
        removed
    }
}

/// Every repository trait backed by process memory.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDatabase").finish_non_exhaustive()
    }
}

fn conflict(what: &str) -> TrimlyError {
    TrimlyError::conflict(format!("{} already exists", what))
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: UserId) -> TrimlyResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .get(&id)
            .filter(|u| u.status != AccountStatus::Deleted)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> TrimlyResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.status != AccountStatus::Deleted && u.email.as_str().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> TrimlyResult<bool> {
        Ok(self.tables.read().live_email_taken(email, None))
    }

    async fn find_employees(
        &self,
        tenant_id: TenantId,
        salon_id: Option<SalonId>,
        page: PageRequest,
    ) -> TrimlyResult<Page<User>> {
        let tables = self.tables.read();
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| {
                u.tenant_id == Some(tenant_id)
                    && matches!(u.role, UserRole::Manager | UserRole::Staff)
                    && u.status != AccountStatus::Deleted
                    && salon_id.map_or(true, |s| u.salon_id == Some(s))
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page.paginate(users))
    }

    async fn save(&self, user: &User) -> TrimlyResult<User> {
        let mut tables = self.tables.write();
        if tables.live_email_taken(user.email.as_str(), None) {
            return Err(conflict("Email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> TrimlyResult<User> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user.id) {
            return Err(TrimlyError::not_found("User", user.id));
        }
        if user.status != AccountStatus::Deleted && tables.live_email_taken(user.email.as_str(), Some(user.id)) {
            return Err(conflict("Email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> TrimlyResult<bool> {
        let mut tables = self.tables.write();
        match tables.users.get_mut(&id) {
            Some(user) if user.status != AccountStatus::Deleted => {
                user.status = AccountStatus::Deleted;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl PlanRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: PlanId) -> TrimlyResult<Option<Plan>> {
        Ok(self.tables.read().plans.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> TrimlyResult<Option<Plan>> {
        Ok(self
            .tables
            .read()
            .plans
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_all(&self, active_only: bool) -> TrimlyResult<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .tables
            .read()
            .plans
            .values()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        Ok(plans)
    }

    async fn save(&self, plan: &Plan) -> TrimlyResult<Plan> {
        let mut tables = self.tables.write();
        if tables.plans.values().any(|p| p.name.eq_ignore_ascii_case(&plan.name)) {
            return Err(conflict("Plan name"));
        }
        tables.plans.insert(plan.id, plan.clone());
        Ok(plan.clone())
    }

    async fn update(&self, plan: &Plan) -> TrimlyResult<Plan> {
        let mut tables = self.tables.write();
        if !tables.plans.contains_key(&plan.id) {
            return Err(TrimlyError::not_found("Plan", plan.id));
        }
        if tables
            .plans
            .values()
            .any(|p| p.id != plan.id && p.name.eq_ignore_ascii_case(&plan.name))
        {
            return Err(conflict("Plan name"));
        }
        tables.plans.insert(plan.id, plan.clone());
        Ok(plan.clone())
    }
}

#[async_trait]
impl SalonRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: SalonId) -> TrimlyResult<Option<Salon>> {
        Ok(self.tables.read().salons.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: TenantId, page: PageRequest) -> TrimlyResult<Page<Salon>> {
        let mut salons: Vec<Salon> = self
            .tables
            .read()
            .salons
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        salons.sort_by_key(|s| (s.created_at, s.id));
        Ok(page.paginate(salons))
    }

    async fn find_all(&self, page: PageRequest) -> TrimlyResult<Page<Salon>> {
        let mut salons: Vec<Salon> = self.tables.read().salons.values().cloned().collect();
        salons.sort_by_key(|s| (s.created_at, s.id));
        Ok(page.paginate(salons))
    }

    async fn count_by_owner(&self, owner_id: TenantId) -> TrimlyResult<u64> {
        Ok(self
            .tables
            .read()
            .salons
            .values()
            .filter(|s| s.owner_id == owner_id)
            .count() as u64)
    }

    async fn save(&self, salon: &Salon) -> TrimlyResult<Salon> {
        self.tables.write().salons.insert(salon.id, salon.clone());
        Ok(salon.clone())
    }

    async fn update(&self, salon: &Salon) -> TrimlyResult<Salon> {
        let mut tables = self.tables.write();
        match tables.salons.get_mut(&salon.id) {
            Some(existing) => {
                *existing = salon.clone();
                Ok(salon.clone())
            }
            None => Err(TrimlyError::not_found("Salon", salon.id)),
        }
    }

    async fn delete(&self, id: SalonId) -> TrimlyResult<bool> {
        let mut tables = self.tables.write();
        if tables.salons.remove(&id).is_none() {
            return Ok(false);
        }
        let staff: Vec<StaffId> = tables.staff.values().filter(|s| s.salon_id == id).map(|s| s.id).collect();
        for staff_id in staff {
            tables.remove_staff(staff_id);
        }
        let services: Vec<ServiceId> = tables
            .services
            .values()
            .filter(|s| s.salon_id == id)
            .map(|s| s.id)
            .collect();
        for service_id in services {
            tables.remove_service(service_id);
        }
        tables.categories.retain(|_, c| c.salon_id != id);
        tables.appointments.retain(|_, a| a.salon_id != id);
        tables.attendance.retain(|_, a| a.salon_id != id);
        tables.inventory.retain(|_, i| i.salon_id != id);
        tables.expenses.retain(|_, e| e.salon_id != id);
        for user in tables.users.values_mut() {
            if user.salon_id == Some(id) {
                user.salon_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: CategoryId) -> TrimlyResult<Option<Category>> {
        Ok(self.tables.read().categories.get(&id).cloned())
    }

    async fn find_by_name(&self, salon_id: SalonId, name: &str) -> TrimlyResult<Option<Category>> {
        Ok(self
            .tables
            .read()
            .categories
            .values()
            .find(|c| c.salon_id == salon_id && c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_by_salon(&self, salon_id: SalonId) -> TrimlyResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .tables
            .read()
            .categories
            .values()
            .filter(|c| c.salon_id == salon_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn save(&self, category: &Category) -> TrimlyResult<Category> {
        let mut tables = self.tables.write();
        if tables
            .categories
            .values()
            .any(|c| c.salon_id == category.salon_id && c.name.eq_ignore_ascii_case(&category.name))
        {
            return Err(conflict("Category"));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn update(&self, category: &Category) -> TrimlyResult<Category> {
        let mut tables = self.tables.write();
        if !tables.categories.contains_key(&category.id) {
            return Err(TrimlyError::not_found("Category", category.id));
        }
        if tables.categories.values().any(|c| {
            c.id != category.id && c.salon_id == category.salon_id && c.name.eq_ignore_ascii_case(&category.name)
        }) {
            return Err(conflict("Category"));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn delete(&self, id: CategoryId) -> TrimlyResult<bool> {
        let mut tables = self.tables.write();
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for service in tables.services.values_mut() {
            if service.category_id == Some(id) {
                service.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl SalonServiceRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: ServiceId) -> TrimlyResult<Option<SalonService>> {
        let tables = self.tables.read();
        Ok(tables.services.get(&id).cloned().map(|s| tables.with_staff_ids(s)))
    }

    async fn find_by_ids(&self, ids: &[ServiceId]) -> TrimlyResult<Vec<SalonService>> {
        let tables = self.tables.read();
        let wanted: BTreeSet<&ServiceId> = ids.iter().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| tables.services.get(id).cloned())
            .map(|s| tables.with_staff_ids(s))
            .collect())
    }

    async fn find_by_salon(&self, salon_id: SalonId, filter: ServiceFilter) -> TrimlyResult<Vec<SalonService>> {
        let tables = self.tables.read();
        let mut services: Vec<SalonService> = tables
            .services
            .values()
            .filter(|s| {
                s.salon_id == salon_id
                    && filter.category_id.map_or(true, |c| s.category_id == Some(c))
                    && filter.active.map_or(true, |a| s.is_active == a)
            })
            .cloned()
            .map(|s| tables.with_staff_ids(s))
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn save(&self, service: &SalonService) -> TrimlyResult<SalonService> {
        let mut tables = self.tables.write();
        let mut stored = service.clone();
        stored.staff_ids.clear();
        tables.services.insert(stored.id, stored.clone());
        Ok(tables.with_staff_ids(stored))
    }

    async fn update(&self, service: &SalonService) -> TrimlyResult<SalonService> {
        let mut tables = self.tables.write();
        if !tables.services.contains_key(&service.id) {
            return Err(TrimlyError::not_found("Service", service.id));
        }
        tables.services.insert(service.id, service.clone());
        Ok(tables.with_staff_ids(service.clone()))
    }

    async fn delete(&self, id: ServiceId) -> TrimlyResult<bool> {
        Ok(self.tables.write().remove_service(id))
    }

    async fn replace_staff(&self, id: ServiceId, staff_ids: &[StaffId]) -> TrimlyResult<()> {
        let mut tables = self.tables.write();
        tables.assignments.retain(|(_, svc)| *svc != id);
        for staff in staff_ids {
            tables.assignments.insert((*staff, id));
        }
        Ok(())
    }
}

#[async_trait]
impl StaffRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: StaffId) -> TrimlyResult<Option<Staff>> {
        let tables = self.tables.read();
        Ok(tables.staff.get(&id).cloned().map(|s| tables.with_service_ids(s)))
    }

    async fn find_by_ids(&self, ids: &[StaffId]) -> TrimlyResult<Vec<Staff>> {
        let tables = self.tables.read();
        let wanted: BTreeSet<&StaffId> = ids.iter().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| tables.staff.get(id).cloned())
            .map(|s| tables.with_service_ids(s))
            .collect())
    }

    async fn find_by_user(&self, user_id: UserId) -> TrimlyResult<Option<Staff>> {
        let tables = self.tables.read();
        Ok(tables
            .staff
            .values()
            .find(|s| s.user_id == Some(user_id))
            .cloned()
            .map(|s| tables.with_service_ids(s)))
    }

    async fn find_by_salon(&self, salon_id: SalonId, active: Option<bool>) -> TrimlyResult<Vec<Staff>> {
        let tables = self.tables.read();
        let mut staff: Vec<Staff> = tables
            .staff
            .values()
            .filter(|s| s.salon_id == salon_id && active.map_or(true, |a| s.is_active == a))
            .cloned()
            .map(|s| tables.with_service_ids(s))
            .collect();
        staff.sort_by_key(|s| s.id);
        Ok(staff)
    }

    async fn count_active(&self, salon_id: SalonId) -> TrimlyResult<u64> {
        Ok(self
            .tables
            .read()
            .staff
            .values()
            .filter(|s| s.salon_id == salon_id && s.is_active)
            .count() as u64)
    }

    async fn save(&self, staff: &Staff) -> TrimlyResult<Staff> {
        let mut tables = self.tables.write();
        if staff.user_id.is_some() && tables.staff.values().any(|s| s.user_id == staff.user_id) {
            return Err(conflict("Staff record for this user"));
        }
        let mut stored = staff.clone();
        stored.service_ids.clear();
        tables.staff.insert(stored.id, stored.clone());
        Ok(tables.with_service_ids(stored))
    }

    async fn update(&self, staff: &Staff) -> TrimlyResult<Staff> {
        let mut tables = self.tables.write();
        if !tables.staff.contains_key(&staff.id) {
            return Err(TrimlyError::not_found("Staff", staff.id));
        }
        if staff.user_id.is_some()
            && tables
                .staff
                .values()
                .any(|s| s.id != staff.id && s.user_id == staff.user_id)
        {
            return Err(conflict("Staff record for this user"));
        }
        tables.staff.insert(staff.id, staff.clone());
        Ok(tables.with_service_ids(staff.clone()))
    }

    async fn delete(&self, id: StaffId) -> TrimlyResult<bool> {
        Ok(self.tables.write().remove_staff(id))
    }

    async fn replace_services(&self, id: StaffId, service_ids: &[ServiceId]) -> TrimlyResult<()> {
        let mut tables = self.tables.write();
        tables.assignments.retain(|(staff, _)| *staff != id);
        for service in service_ids {
            tables.assignments.insert((id, *service));
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: CustomerId) -> TrimlyResult<Option<Customer>> {
        Ok(self.tables.read().customers.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> TrimlyResult<Option<Customer>> {
        Ok(self
            .tables
            .read()
            .customers
            .values()
            .find(|c| c.phone == phone)
            .cloned())
    }

    async fn save(&self, customer: &Customer) -> TrimlyResult<Customer> {
        let mut tables = self.tables.write();
        if tables.customers.values().any(|c| c.phone == customer.phone) {
            return Err(conflict("Customer phone"));
        }
        tables.customers.insert(customer.id, customer.clone());
        Ok(customer.clone())
    }

    async fn update(&self, customer: &Customer) -> TrimlyResult<Customer> {
        let mut tables = self.tables.write();
        match tables.customers.get_mut(&customer.id) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(customer.clone())
            }
            None => Err(TrimlyError::not_found("Customer", customer.id)),
        }
    }
}

#[async_trait]
impl OtpRepository for InMemoryDatabase {
    async fn find(&self, phone: &str) -> TrimlyResult<Option<OtpChallenge>> {
        Ok(self.tables.read().otp.get(phone).cloned())
    }

    async fn upsert(&self, challenge: &OtpChallenge) -> TrimlyResult<()> {
        self.tables
            .write()
            .otp
            .insert(challenge.phone.clone(), challenge.clone());
        Ok(())
    }

    async fn consume_attempt(
        &self,
        phone: &str,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> TrimlyResult<Option<OtpChallenge>> {
        let mut tables = self.tables.write();
        Ok(tables
            .otp
            .get_mut(phone)
            .filter(|c| !c.is_expired(now) && !c.attempts_exhausted(max_attempts))
            .map(|challenge| {
                challenge.attempts += 1;
                challenge.clone()
            }))
    }

    async fn delete(&self, phone: &str) -> TrimlyResult<bool> {
        Ok(self.tables.write().otp.remove(phone).is_some())
    }
}

fn by_start(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by_key(|a| (a.date, a.start_time, a.id));
    appointments
}

#[async_trait]
impl AppointmentRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: AppointmentId) -> TrimlyResult<Option<Appointment>> {
        Ok(self.tables.read().appointments.get(&id).cloned())
    }

    async fn find_by_salon_on(&self, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Appointment>> {
        Ok(by_start(
            self.tables
                .read()
                .appointments
                .values()
                .filter(|a| a.salon_id == salon_id && a.date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_staff_on(&self, staff_id: StaffId, date: NaiveDate) -> TrimlyResult<Vec<Appointment>> {
        Ok(by_start(
            self.tables
                .read()
                .appointments
                .values()
                .filter(|a| a.staff_id == staff_id && a.date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn find_filtered(&self, filter: AppointmentFilter, page: PageRequest) -> TrimlyResult<Page<Appointment>> {
        let matching = by_start(
            self.tables
                .read()
                .appointments
                .values()
                .filter(|a| {
                    a.salon_id == filter.salon_id
                        && filter.date.map_or(true, |d| a.date == d)
                        && filter.staff_id.map_or(true, |s| a.staff_id == s)
                        && filter.status.map_or(true, |s| a.status == s)
                })
                .cloned()
                .collect(),
        );
        Ok(page.paginate(matching))
    }

    async fn find_by_customer(&self, customer_id: CustomerId, page: PageRequest) -> TrimlyResult<Page<Appointment>> {
        let mut matching = by_start(
            self.tables
                .read()
                .appointments
                .values()
                .filter(|a| a.customer_id == Some(customer_id))
                .cloned()
                .collect(),
        );
        matching.reverse();
        Ok(page.paginate(matching))
    }

    async fn count_upcoming(&self, salon_id: SalonId, staff_id: Option<StaffId>, from: NaiveDate) -> TrimlyResult<u64> {
        let count = self
            .tables
            .read()
            .appointments
            .values()
            .filter(|a| {
                a.salon_id == salon_id
                    && staff_id.map_or(true, |s| a.staff_id == s)
                    && a.date >= from
                    && a.status.is_upcoming()
            })
            .count();
        Ok(count as u64)
    }

    async fn save(&self, appointment: &Appointment) -> TrimlyResult<Appointment> {
        let mut tables = self.tables.write();
        reject_overlap(&tables, appointment)?;
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn update(&self, appointment: &Appointment) -> TrimlyResult<Appointment> {
        let mut tables = self.tables.write();
        reject_overlap(&tables, appointment)?;
        match tables.appointments.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment.clone();
                Ok(appointment.clone())
            }
            None => Err(TrimlyError::not_found("Appointment", appointment.id)),
        }
    }
}

/// Mirrors the database exclusion constraint: live appointments of one staff
/// member may not overlap.
fn reject_overlap(tables: &Tables, appointment: &Appointment) -> TrimlyResult<()> {
    if !appointment.status.blocks_slot() {
        return Ok(());
    }
    let clash = tables.appointments.values().any(|other| {
        other.id != appointment.id
            && other.staff_id == appointment.staff_id
            && other.date == appointment.date
            && other.status.blocks_slot()
            && other.start_time < appointment.end_time
            && appointment.start_time < other.end_time
    });
    if clash {
        return Err(TrimlyError::conflict("Staff member is already booked for that time"));
    }
    Ok(())
}

#[async_trait]
impl AttendanceRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: AttendanceId) -> TrimlyResult<Option<Attendance>> {
        Ok(self.tables.read().attendance.get(&id).cloned())
    }

    async fn find_by_staff_on(&self, staff_id: StaffId, date: NaiveDate) -> TrimlyResult<Option<Attendance>> {
        Ok(self
            .tables
            .read()
            .attendance
            .values()
            .find(|a| a.staff_id == staff_id && a.date == date)
            .cloned())
    }

    async fn find_by_salon_on(&self, salon_id: SalonId, date: NaiveDate) -> TrimlyResult<Vec<Attendance>> {
        let mut records: Vec<Attendance> = self
            .tables
            .read()
            .attendance
            .values()
            .filter(|a| a.salon_id == salon_id && a.date == date)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.staff_id);
        Ok(records)
    }

    async fn find_by_staff_between(
        &self,
        staff_id: StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TrimlyResult<Vec<Attendance>> {
        let mut records: Vec<Attendance> = self
            .tables
            .read()
            .attendance
            .values()
            .filter(|a| a.staff_id == staff_id && a.date >= from && a.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.date);
        Ok(records)
    }

    async fn save(&self, attendance: &Attendance) -> TrimlyResult<Attendance> {
        let mut tables = self.tables.write();
        if tables
            .attendance
            .values()
            .any(|a| a.staff_id == attendance.staff_id && a.date == attendance.date)
        {
            return Err(conflict("Attendance for this date"));
        }
        tables.attendance.insert(attendance.id, attendance.clone());
        Ok(attendance.clone())
    }

    async fn update(&self, attendance: &Attendance) -> TrimlyResult<Attendance> {
        let mut tables = self.tables.write();
        match tables.attendance.get_mut(&attendance.id) {
            Some(existing) => {
                *existing = attendance.clone();
                Ok(attendance.clone())
            }
            None => Err(TrimlyError::not_found("Attendance", attendance.id)),
        }
    }
}

#[async_trait]
impl InventoryRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: InventoryItemId) -> TrimlyResult<Option<InventoryItem>> {
        Ok(self.tables.read().inventory.get(&id).cloned())
    }

    async fn find_by_sku(&self, salon_id: SalonId, sku: &str) -> TrimlyResult<Option<InventoryItem>> {
        Ok(self
            .tables
            .read()
            .inventory
            .values()
            .find(|i| i.salon_id == salon_id && i.sku.eq_ignore_ascii_case(sku))
            .cloned())
    }

    async fn find_by_salon(&self, salon_id: SalonId, page: PageRequest) -> TrimlyResult<Page<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self
            .tables
            .read()
            .inventory
            .values()
            .filter(|i| i.salon_id == salon_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page.paginate(items))
    }

    async fn find_low_stock(&self, salon_id: SalonId) -> TrimlyResult<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self
            .tables
            .read()
            .inventory
            .values()
            .filter(|i| i.salon_id == salon_id && i.is_low_stock())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }

    async fn save(&self, item: &InventoryItem) -> TrimlyResult<InventoryItem> {
        let mut tables = self.tables.write();
        if tables
            .inventory
            .values()
            .any(|i| i.salon_id == item.salon_id && i.sku.eq_ignore_ascii_case(&item.sku))
        {
            return Err(conflict("SKU"));
        }
        tables.inventory.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn update(&self, item: &InventoryItem) -> TrimlyResult<InventoryItem> {
        let mut tables = self.tables.write();
        if !tables.inventory.contains_key(&item.id) {
            return Err(TrimlyError::not_found("InventoryItem", item.id));
        }
        if tables
            .inventory
            .values()
            .any(|i| i.id != item.id && i.salon_id == item.salon_id && i.sku.eq_ignore_ascii_case(&item.sku))
        {
            return Err(conflict("SKU"));
        }
        let mut stored = item.clone();
        if let Some(existing) = tables.inventory.get(&item.id) {
            stored.quantity = existing.quantity;
        }
        tables.inventory.insert(item.id, stored.clone());
        Ok(stored)
    }

    async fn adjust_quantity(
        &self,
        id: InventoryItemId,
        delta: i32,
        now: DateTime<Utc>,
    ) -> TrimlyResult<Option<InventoryItem>> {
        let mut tables = self.tables.write();
        let Some(item) = tables.inventory.get_mut(&id) else {
            return Ok(None);
        };
        let Some(quantity) = item.quantity_after(delta)? else {
            return Ok(None);
        };
        item.quantity = quantity;
        item.updated_at = now;
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: InventoryItemId) -> TrimlyResult<bool> {
        Ok(self.tables.write().inventory.remove(&id).is_some())
    }
}

fn expense_matches(expense: &Expense, filter: &ExpenseFilter) -> bool {
    expense.salon_id == filter.salon_id
        && filter.from.map_or(true, |d| expense.expense_date >= d)
        && filter.to.map_or(true, |d| expense.expense_date <= d)
        && filter.category.map_or(true, |c| expense.category == c)
}

#[async_trait]
impl ExpenseRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: ExpenseId) -> TrimlyResult<Option<Expense>> {
        Ok(self.tables.read().expenses.get(&id).cloned())
    }

    async fn find_filtered(&self, filter: ExpenseFilter, page: PageRequest) -> TrimlyResult<Page<Expense>> {
        let mut expenses: Vec<Expense> = self
            .tables
            .read()
            .expenses
            .values()
            .filter(|e| expense_matches(e, &filter))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| {
            b.expense_date
                .cmp(&a.expense_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(page.paginate(expenses))
    }

    async fn totals_by_category(&self, filter: ExpenseFilter) -> TrimlyResult<Vec<(ExpenseCategory, Decimal)>> {
        let tables = self.tables.read();
        let mut totals: BTreeMap<&'static str, (ExpenseCategory, Decimal)> = BTreeMap::new();
        for expense in tables.expenses.values().filter(|e| expense_matches(e, &filter)) {
            let entry = totals
                .entry(expense.category.as_str())
                .or_insert((expense.category, Decimal::ZERO));
            entry.1 += expense.amount;
        }
        Ok(totals.into_values().collect())
    }

    async fn save(&self, expense: &Expense) -> TrimlyResult<Expense> {
        self.tables.write().expenses.insert(expense.id, expense.clone());
        Ok(expense.clone())
    }

    async fn update(&self, expense: &Expense) -> TrimlyResult<Expense> {
        let mut tables = self.tables.write();
        match tables.expenses.get_mut(&expense.id) {
            Some(existing) => {
                *existing = expense.clone();
                Ok(expense.clone())
            }
            None => Err(TrimlyError::not_found("Expense", expense.id)),
        }
    }

    async fn delete(&self, id: ExpenseId) -> TrimlyResult<bool> {
        Ok(self.tables.write().expenses.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use trimly_core::{AppointmentKind, CustomerDetails, Email, PaymentMethod, SalonSchedule, TimeSlot, WeekdaySet};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    async fn seeded_salon(db: &InMemoryDatabase) -> Salon {
        let owner = User::new_admin(
            "Asha".into(),
            Email::new_unchecked("asha@example.com"),
            "hash".into(),
            None,
            now(),
            14,
        );
        UserRepository::save(db, &owner).await.unwrap();
        let schedule = SalonSchedule {
            opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            working_days: WeekdaySet::MON_TO_SAT,
            slot_interval_minutes: 15,
            utc_offset_minutes: 0,
        };
        let salon = Salon::new(owner.id, "Glow".into(), schedule, now()).unwrap();
        SalonRepository::save(db, &salon).await.unwrap()
    }

    #[tokio::test]
    async fn test_consume_attempt_stops_at_limit() {
        let db = InMemoryDatabase::new();
        let phone = "+919800000002";
        let challenge = OtpChallenge::new(phone.into(), "hash".into(), now() + chrono::Duration::minutes(5), now());
        OtpRepository::upsert(&db, &challenge).await.unwrap();

        for expected in 1..=3 {
            let taken = OtpRepository::consume_attempt(&db, phone, 3, now()).await.unwrap().unwrap();
            assert_eq!(taken.attempts, expected);
        }
        assert!(OtpRepository::consume_attempt(&db, phone, 3, now()).await.unwrap().is_none());
        assert_eq!(OtpRepository::find(&db, phone).await.unwrap().unwrap().attempts, 3);

        let later = now() + chrono::Duration::minutes(5);
        OtpRepository::upsert(&db, &challenge).await.unwrap();
        assert!(OtpRepository::consume_attempt(&db, phone, 3, later).await.unwrap().is_none());
        assert_eq!(OtpRepository::find(&db, phone).await.unwrap().unwrap().attempts, 0);
    }

    #[tokio::test]
    async fn test_overlapping_live_appointments_rejected() {
        let db = InMemoryDatabase::new();
        let salon = seeded_salon(&db).await;
        let ravi = StaffRepository::save(&db, &Staff::new(salon.id, "Ravi".into(), now())).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let at = |h: u32, m: u32| {
            let slot = TimeSlot::starting_at(NaiveTime::from_hms_opt(h, m, 0).unwrap(), 30).unwrap();
            Appointment::new(
                salon.id,
                ravi.id,
                vec![ServiceId::new()],
                date,
                slot,
                dec!(25),
                CustomerDetails {
                    name: "Guest".into(),
                    ..CustomerDetails::default()
                },
                AppointmentKind::Scheduled,
                now(),
            )
        };

        let mut first = AppointmentRepository::save(&db, &at(10, 0)).await.unwrap();
        let err = AppointmentRepository::save(&db, &at(10, 15)).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        AppointmentRepository::save(&db, &at(10, 30)).await.unwrap();

        first.cancel(None, now()).unwrap();
        AppointmentRepository::update(&db, &first).await.unwrap();
        AppointmentRepository::save(&db, &at(10, 0)).await.unwrap();

        assert_eq!(db.count_upcoming(salon.id, Some(ravi.id), date).await.unwrap(), 2);
        assert_eq!(db.count_upcoming(salon.id, None, date.succ_opt().unwrap()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_assignment_views_stay_consistent() {
        let db = InMemoryDatabase::new();
        let salon = seeded_salon(&db).await;

        let cut = SalonService::new(salon.id, None, "Haircut".into(), 30, dec!(25), now());
        let color = SalonService::new(salon.id, None, "Colour".into(), 90, dec!(80), now());
        SalonServiceRepository::save(&db, &cut).await.unwrap();
        SalonServiceRepository::save(&db, &color).await.unwrap();
        let ravi = StaffRepository::save(&db, &Staff::new(salon.id, "Ravi".into(), now())).await.unwrap();

        db.replace_services(ravi.id, &[cut.id, color.id]).await.unwrap();
        let cut_loaded = SalonServiceRepository::find_by_id(&db, cut.id).await.unwrap().unwrap();
        assert_eq!(cut_loaded.staff_ids, vec![ravi.id]);

        db.replace_staff(color.id, &[]).await.unwrap();
        let ravi_loaded = StaffRepository::find_by_id(&db, ravi.id).await.unwrap().unwrap();
        assert_eq!(ravi_loaded.service_ids, vec![cut.id]);

        SalonServiceRepository::delete(&db, cut.id).await.unwrap();
        let ravi_loaded = StaffRepository::find_by_id(&db, ravi.id).await.unwrap().unwrap();
        assert!(ravi_loaded.service_ids.is_empty());
    }

    #[tokio::test]
    async fn test_deleting_category_uncategorises_services() {
        let db = InMemoryDatabase::new();
        let salon = seeded_salon(&db).await;
        let hair = Category::new(salon.id, "Hair".into(), None, now());
        CategoryRepository::save(&db, &hair).await.unwrap();
        let cut = SalonService::new(salon.id, Some(hair.id), "Haircut".into(), 30, dec!(25), now());
        SalonServiceRepository::save(&db, &cut).await.unwrap();

        assert!(CategoryRepository::delete(&db, hair.id).await.unwrap());
        let cut = SalonServiceRepository::find_by_id(&db, cut.id).await.unwrap().unwrap();
        assert_eq!(cut.category_id, None);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let db = InMemoryDatabase::new();
        let salon = seeded_salon(&db).await;

        let dup = Category::new(salon.id, "HAIR".into(), None, now());
        CategoryRepository::save(&db, &Category::new(salon.id, "hair".into(), None, now()))
            .await
            .unwrap();
        let err = CategoryRepository::save(&db, &dup).await.unwrap_err();
        assert_eq!(err.status_code(), 409);

        let again = User::new_admin(
            "Other".into(),
            Email::new_unchecked("ASHA@example.com"),
            "hash".into(),
            None,
            now(),
            14,
        );
        assert!(UserRepository::save(&db, &again).await.is_err());
    }

    #[tokio::test]
    async fn test_salon_delete_cascades() {
        let db = InMemoryDatabase::new();
        let salon = seeded_salon(&db).await;
        let expense = Expense::new(
            salon.id,
            ExpenseCategory::Rent,
            dec!(1200),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            PaymentMethod::BankTransfer,
            now(),
        );
        ExpenseRepository::save(&db, &expense).await.unwrap();
        StaffRepository::save(&db, &Staff::new(salon.id, "Ravi".into(), now())).await.unwrap();

        assert!(SalonRepository::delete(&db, salon.id).await.unwrap());
        assert!(ExpenseRepository::find_by_id(&db, expense.id).await.unwrap().is_none());
        assert!(StaffRepository::find_by_salon(&db, salon.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expense_totals_by_category() {
        let db = InMemoryDatabase::new();
        let salon = seeded_salon(&db).await;
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        for (category, amount, date) in [
            (ExpenseCategory::Supplies, dec!(40.50), day(2)),
            (ExpenseCategory::Supplies, dec!(9.50), day(5)),
            (ExpenseCategory::Rent, dec!(1000), day(1)),
            (ExpenseCategory::Marketing, dec!(75), day(20)),
        ] {
            let expense = Expense::new(salon.id, category, amount, date, PaymentMethod::Cash, now());
            ExpenseRepository::save(&db, &expense).await.unwrap();
        }

        let filter = ExpenseFilter {
            to: Some(day(10)),
            ..ExpenseFilter::for_salon(salon.id)
        };
        let totals = db.totals_by_category(filter).await.unwrap();
        assert_eq!(
            totals,
            vec![
                (ExpenseCategory::Rent, dec!(1000)),
                (ExpenseCategory::Supplies, dec!(50.00)),
            ]
        );
    }
}
