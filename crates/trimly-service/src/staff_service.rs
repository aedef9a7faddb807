//! Staff roster of a salon.

use crate::access_service::AccessService;
use crate::dto::{AssignServicesRequest, CreateStaffRequest, StaffQuery, UpdateStaffRequest};
use crate::scope;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{
    normalize_phone, Clock, Email, Interface, Permission, Salon, SalonId, Staff, StaffId,
    TrimlyError, TrimlyResult, UserId, ValidateExt, WeekdaySet,
};
use trimly_repository::Repositories;
use trimly_security::{Claims, ClaimsExt};

/// Staff service trait.
#[async_trait]
pub trait StaffService: Interface + Send + Sync {
    /// Adds a staff member, within the plan's per-salon limit.
    async fn create_staff(&self, claims: &Claims, salon_id: SalonId, request: CreateStaffRequest) -> TrimlyResult<Staff>;

    async fn get_staff(&self, claims: &Claims, id: StaffId) -> TrimlyResult<Staff>;

    async fn list_staff(&self, claims: &Claims, salon_id: SalonId, query: StaffQuery) -> TrimlyResult<Vec<Staff>>;

    async fn update_staff(&self, claims: &Claims, id: StaffId, request: UpdateStaffRequest) -> TrimlyResult<Staff>;

    /// Takes a staff member off the roster without deleting history.
    async fn deactivate_staff(&self, claims: &Claims, id: StaffId) -> TrimlyResult<Staff>;

    async fn delete_staff(&self, claims: &Claims, id: StaffId) -> TrimlyResult<()>;

    /// Replaces the set of services a staff member performs.
    async fn assign_services(&self, claims: &Claims, id: StaffId, request: AssignServicesRequest) -> TrimlyResult<Staff>;
}

/// Staff service implementation.
pub struct StaffServiceImpl {
    repos: Repositories,
    access: Arc<dyn AccessService>,
    clock: Arc<dyn Clock>,
}

impl StaffServiceImpl {
    pub fn new(repos: Repositories, access: Arc<dyn AccessService>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, access, clock }
    }

    async fn load_managed(&self, claims: &Claims, id: StaffId) -> TrimlyResult<(Staff, Salon)> {
        claims.require_permission(Permission::StaffManage)?;
        scope::staff_for(&self.repos, claims, id).await
    }

    /// Checks that `user_id` is an employee of `salon` not yet linked elsewhere.
    async fn check_link(&self, salon: &Salon, user_id: UserId, except: Option<StaffId>) -> TrimlyResult<()> {
        let user = self
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("User", user_id))?;
        if !user.role.is_employee() || user.salon_id != Some(salon.id) {
            return Err(TrimlyError::validation(
                "Linked user must be an employee of the same salon",
            ));
        }
        if let Some(linked) = self.repos.staff.find_by_user(user_id).await? {
            if Some(linked.id) != except {
                return Err(TrimlyError::conflict(format!(
                    "User {user_id} is already linked to staff member {}",
                    linked.id
                )));
            }
        }
        Ok(())
    }

    async fn reload(&self, id: StaffId) -> TrimlyResult<Staff> {
        self.repos
            .staff
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Staff", id))
    }
}

fn contact(phone: Option<String>, email: Option<String>) -> TrimlyResult<(Option<String>, Option<String>)> {
    Ok((
        phone.as_deref().map(normalize_phone).transpose()?,
        email.map(|e| Email::new(e).map(String::from)).transpose()?,
    ))
}

#[async_trait]
impl StaffService for StaffServiceImpl {
    async fn create_staff(&self, claims: &Claims, salon_id: SalonId, request: CreateStaffRequest) -> TrimlyResult<Staff> {
        debug!("Adding staff member {} to salon {}", request.name, salon_id);
        claims.require_permission(Permission::StaffManage)?;
        request.validate_request()?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        self.access.ensure_staff_quota(salon.owner_id, salon.id).await?;

        if let Some(user_id) = request.user_id {
            self.check_link(&salon, user_id, None).await?;
        }
        let service_ids = scope::dedup_ids(&request.service_ids);
        scope::ensure_services_in_salon(&self.repos, salon.id, &service_ids).await?;

        let (phone, email) = contact(request.phone, request.email)?;
        let mut staff = Staff::new(salon.id, request.name.trim().to_string(), self.clock.now());
        staff.user_id = request.user_id;
        staff.phone = phone;
        staff.email = email;
        staff.designation = request.designation;
        staff.weekly_off = WeekdaySet::from(request.weekly_off);
        staff.joined_on = request.joined_on;

        let saved = self.repos.staff.save(&staff).await?;
        if !service_ids.is_empty() {
            self.repos.staff.replace_services(saved.id, &service_ids).await?;
        }
        info!("Staff member {} added to salon {}", saved.id, salon.id);
        self.reload(saved.id).await
    }

    async fn get_staff(&self, claims: &Claims, id: StaffId) -> TrimlyResult<Staff> {
        claims.require_permission(Permission::SalonRead)?;
        scope::staff_for(&self.repos, claims, id).await.map(|(staff, _)| staff)
    }

    async fn list_staff(&self, claims: &Claims, salon_id: SalonId, query: StaffQuery) -> TrimlyResult<Vec<Staff>> {
        claims.require_permission(Permission::SalonRead)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        self.repos.staff.find_by_salon(salon.id, query.active).await
    }

    async fn update_staff(&self, claims: &Claims, id: StaffId, request: UpdateStaffRequest) -> TrimlyResult<Staff> {
        request.validate_request()?;
        let (mut staff, salon) = self.load_managed(claims, id).await?;

        if request.is_active == Some(true) && !staff.is_active {
            self.access.ensure_staff_quota(salon.owner_id, salon.id).await?;
        }
        if let Some(name) = request.name {
            staff.name = name.trim().to_string();
        }
        let (phone, email) = contact(request.phone, request.email)?;
        if phone.is_some() {
            staff.phone = phone;
        }
        if email.is_some() {
            staff.email = email;
        }
        if let Some(designation) = request.designation {
            staff.designation = Some(designation);
        }
        if let Some(days) = request.weekly_off {
            staff.weekly_off = WeekdaySet::from(days);
        }
        if let Some(joined_on) = request.joined_on {
            staff.joined_on = Some(joined_on);
        }
        if let Some(active) = request.is_active {
            staff.is_active = active;
        }
        staff.updated_at = self.clock.now();

        let updated = self.repos.staff.update(&staff).await?;
        info!("Staff member {} updated", updated.id);
        Ok(updated)
    }

    async fn deactivate_staff(&self, claims: &Claims, id: StaffId) -> TrimlyResult<Staff> {
        let (mut staff, _) = self.load_managed(claims, id).await?;
        staff.is_active = false;
        staff.updated_at = self.clock.now();
        let updated = self.repos.staff.update(&staff).await?;
        info!("Staff member {} deactivated", id);
        Ok(updated)
    }

    async fn delete_staff(&self, claims: &Claims, id: StaffId) -> TrimlyResult<()> {
        let (staff, salon) = self.load_managed(claims, id).await?;
        let today = salon.local_time(self.clock.now()).date();
        let upcoming = self
            .repos
            .appointments
            .count_upcoming(salon.id, Some(staff.id), today)
            .await?;
        if upcoming > 0 {
            return Err(TrimlyError::conflict(format!(
                "Staff member has {upcoming} upcoming appointments; cancel them or deactivate the staff member instead"
            )));
        }
        if !self.repos.staff.delete(staff.id).await? {
            return Err(TrimlyError::not_found("Staff", id));
        }
        info!("Staff member {} deleted", id);
        Ok(())
    }

    async fn assign_services(&self, claims: &Claims, id: StaffId, request: AssignServicesRequest) -> TrimlyResult<Staff> {
        let (staff, salon) = self.load_managed(claims, id).await?;
        let service_ids = scope::dedup_ids(&request.service_ids);
        scope::ensure_services_in_salon(&self.repos, salon.id, &service_ids).await?;

        self.repos.staff.replace_services(staff.id, &service_ids).await?;
        info!("Staff member {} now performs {} services", id, service_ids.len());
        self.reload(staff.id).await
    }
}

impl std::fmt::Debug for StaffServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffServiceImpl").finish_non_exhaustive()
    }
}
