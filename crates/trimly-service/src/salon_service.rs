//! Salon (branch) management.

use crate::access_service::AccessService;
use crate::dto::{CreateSalonRequest, HolidaysRequest, UpdateSalonRequest};
use crate::scope;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use trimly_core::{
    normalize_phone, Clock, Email, Interface, Page, PageRequest, Permission, Salon, SalonId,
    SalonSchedule, TrimlyError, TrimlyResult, ValidateExt, WeekdaySet,
};
use trimly_repository::Repositories;
use trimly_security::{pinned_salon, Claims, ClaimsExt};

/// Salon management service trait.
#[async_trait]
pub trait SalonManagementService: Interface + Send + Sync {
    /// Opens a new salon for the caller's tenant, within plan limits.
    async fn create_salon(&self, claims: &Claims, request: CreateSalonRequest) -> TrimlyResult<Salon>;

    async fn get_salon(&self, claims: &Claims, id: SalonId) -> TrimlyResult<Salon>;

    /// Salons visible to the caller.
    async fn list_salons(&self, claims: &Claims, page: PageRequest) -> TrimlyResult<Page<Salon>>;

    async fn update_salon(&self, claims: &Claims, id: SalonId, request: UpdateSalonRequest) -> TrimlyResult<Salon>;

    /// Removes a salon and everything recorded under it.
    async fn delete_salon(&self, claims: &Claims, id: SalonId) -> TrimlyResult<()>;

    async fn add_holidays(&self, claims: &Claims, id: SalonId, request: HolidaysRequest) -> TrimlyResult<Salon>;

    async fn remove_holidays(&self, claims: &Claims, id: SalonId, request: HolidaysRequest) -> TrimlyResult<Salon>;
}

/// Salon management service implementation.
pub struct SalonManagementServiceImpl {
    repos: Repositories,
    access: Arc<dyn AccessService>,
    clock: Arc<dyn Clock>,
    default_slot_interval: i32,
}

impl SalonManagementServiceImpl {
    pub fn new(
        repos: Repositories,
        access: Arc<dyn AccessService>,
        clock: Arc<dyn Clock>,
        default_slot_interval: i32,
    ) -> Self {
        Self {
            repos,
            access,
            clock,
            default_slot_interval,
        }
    }

    async fn load_managed(&self, claims: &Claims, id: SalonId) -> TrimlyResult<Salon> {
        claims.require_permission(Permission::SalonManage)?;
        scope::salon_for(&self.repos, claims, id).await
    }
}

fn normalize_contact(phone: Option<String>, email: Option<String>) -> TrimlyResult<(Option<String>, Option<String>)> {
    let phone = phone.as_deref().map(normalize_phone).transpose()?;
    let email = email.map(|e| Email::new(e).map(String::from)).transpose()?;
    Ok((phone, email))
}

#[async_trait]
impl SalonManagementService for SalonManagementServiceImpl {
    async fn create_salon(&self, claims: &Claims, request: CreateSalonRequest) -> TrimlyResult<Salon> {
        debug!("Creating salon: {}", request.name);
        claims.require_permission(Permission::SalonManage)?;
        request.validate_request()?;
        let tenant = claims.require_tenant()?;
        self.access.ensure_salon_quota(tenant).await?;

        let schedule = SalonSchedule {
            opening_time: request.opening_time,
            closing_time: request.closing_time,
            working_days: request
                .working_days
                .map_or(WeekdaySet::MON_TO_SAT, WeekdaySet::from),
            slot_interval_minutes: request
                .slot_interval_minutes
                .unwrap_or(self.default_slot_interval),
            utc_offset_minutes: request.utc_offset_minutes,
        };
        let mut salon = Salon::new(tenant, request.name.trim().to_string(), schedule, self.clock.now())?;
        let (phone, email) = normalize_contact(request.phone, request.email)?;
        salon.address = request.address;
        salon.phone = phone;
        salon.email = email;

        let saved = self.repos.salons.save(&salon).await?;
        info!("Salon {} created for tenant {}", saved.id, tenant);
        Ok(saved)
    }

    async fn get_salon(&self, claims: &Claims, id: SalonId) -> TrimlyResult<Salon> {
        claims.require_permission(Permission::SalonRead)?;
        scope::salon_for(&self.repos, claims, id).await
    }

    async fn list_salons(&self, claims: &Claims, page: PageRequest) -> TrimlyResult<Page<Salon>> {
        claims.require_permission(Permission::SalonRead)?;
        if claims.is_super_admin() {
            return self.repos.salons.find_all(page).await;
        }
        if let Some(salon_id) = pinned_salon(claims) {
            let own: Vec<Salon> = self.repos.salons.find_by_id(salon_id).await?.into_iter().collect();
            return Ok(page.paginate(own));
        }
        let tenant = claims.require_tenant()?;
        self.repos.salons.find_by_owner(tenant, page).await
    }

    async fn update_salon(&self, claims: &Claims, id: SalonId, request: UpdateSalonRequest) -> TrimlyResult<Salon> {
        request.validate_request()?;
        let mut salon = self.load_managed(claims, id).await?;
        let now = self.clock.now();

        let current = salon.schedule();
        let schedule = SalonSchedule {
            opening_time: request.opening_time.unwrap_or(current.opening_time),
            closing_time: request.closing_time.unwrap_or(current.closing_time),
            working_days: request
                .working_days
                .map_or(current.working_days, WeekdaySet::from),
            slot_interval_minutes: request
                .slot_interval_minutes
                .unwrap_or(current.slot_interval_minutes),
            utc_offset_minutes: request.utc_offset_minutes.unwrap_or(current.utc_offset_minutes),
        };
        if schedule != current {
            salon.set_schedule(schedule, now)?;
        }

        if let Some(name) = request.name {
            salon.name = name.trim().to_string();
        }
        if let Some(address) = request.address {
            salon.address = Some(address);
        }
        let (phone, email) = normalize_contact(request.phone, request.email)?;
        if phone.is_some() {
            salon.phone = phone;
        }
        if email.is_some() {
            salon.email = email;
        }
        if let Some(active) = request.is_active {
            salon.is_active = active;
        }
        salon.updated_at = now;

        let updated = self.repos.salons.update(&salon).await?;
        info!("Salon {} updated", updated.id);
        Ok(updated)
    }

    async fn delete_salon(&self, claims: &Claims, id: SalonId) -> TrimlyResult<()> {
        let salon = self.load_managed(claims, id).await?;
        let today = salon.local_time(self.clock.now()).date();
        let upcoming = self.repos.appointments.count_upcoming(salon.id, None, today).await?;
        if upcoming > 0 {
            return Err(TrimlyError::conflict(format!(
                "Salon has {upcoming} upcoming appointments; cancel them or deactivate the salon instead"
            )));
        }
        if !self.repos.salons.delete(salon.id).await? {
            return Err(TrimlyError::not_found("Salon", id));
        }
        info!("Salon {} deleted", id);
        Ok(())
    }

    async fn add_holidays(&self, claims: &Claims, id: SalonId, request: HolidaysRequest) -> TrimlyResult<Salon> {
        request.validate_request()?;
        let mut salon = self.load_managed(claims, id).await?;
        salon.add_holidays(&request.dates, self.clock.now());
        let updated = self.repos.salons.update(&salon).await?;
        info!("Salon {} now has {} holidays", id, updated.holidays.len());
        Ok(updated)
    }

    async fn remove_holidays(&self, claims: &Claims, id: SalonId, request: HolidaysRequest) -> TrimlyResult<Salon> {
        request.validate_request()?;
        let mut salon = self.load_managed(claims, id).await?;
        salon.remove_holidays(&request.dates, self.clock.now());
        let updated = self.repos.salons.update(&salon).await?;
        info!("Salon {} now has {} holidays", id, updated.holidays.len());
        Ok(updated)
    }
}

impl std::fmt::Debug for SalonManagementServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalonManagementServiceImpl")
            .field("default_slot_interval", &self.default_slot_interval)
            .finish_non_exhaustive()
    }
}
