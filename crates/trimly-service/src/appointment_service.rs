//! Appointment booking, walk-ins, and the appointment lifecycle.
//!
//! Writes to a salon's book are serialised per salon, so two requests can
//! never both see a slot as free and both take it.

use crate::dto::{
    AppointmentQuery, BookAppointmentRequest, CancelAppointmentRequest, CustomerBookingRequest, RescheduleRequest,
    SlotQuery, UpdateAppointmentStatusRequest, WalkInRequest,
};
use crate::scheduling::{self, AvailableSlot, StaffDay};
use crate::scope;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};
use trimly_config::BookingConfig;
use trimly_core::{
    normalize_phone, Appointment, AppointmentId, AppointmentKind, Clock, CustomerDetails, Interface, Page,
    PageRequest, Permission, Salon, SalonId, ServiceId, Staff, StaffId, TimeSlot, TrimlyError, TrimlyResult,
    UserRole, ValidateExt,
};
use trimly_repository::{AppointmentFilter, Repositories};
use trimly_security::{Claims, ClaimsExt};

/// Appointment service trait.
#[async_trait]
pub trait AppointmentService: Interface + Send + Sync {
    /// Front-desk booking of a staff member at a given time.
    async fn book(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: BookAppointmentRequest,
    ) -> TrimlyResult<Appointment>;

    /// Seats a walk-in customer in the earliest free slot from now.
    async fn walk_in(&self, claims: &Claims, salon_id: SalonId, request: WalkInRequest) -> TrimlyResult<Appointment>;

    /// Free grid slots on a date for the requested services.
    async fn available_slots(&self, salon_id: SalonId, query: SlotQuery) -> TrimlyResult<Vec<AvailableSlot>>;

    async fn get_appointment(&self, claims: &Claims, id: AppointmentId) -> TrimlyResult<Appointment>;

    async fn list_appointments(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        query: AppointmentQuery,
        page: PageRequest,
    ) -> TrimlyResult<Page<Appointment>>;

    async fn reschedule(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: RescheduleRequest,
    ) -> TrimlyResult<Appointment>;

    async fn update_status(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: UpdateAppointmentStatusRequest,
    ) -> TrimlyResult<Appointment>;

    async fn cancel(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: CancelAppointmentRequest,
    ) -> TrimlyResult<Appointment>;

    /// Booking by a signed-in customer for themselves.
    async fn customer_book(&self, claims: &Claims, request: CustomerBookingRequest) -> TrimlyResult<Appointment>;

    async fn my_appointments(&self, claims: &Claims, page: PageRequest) -> TrimlyResult<Page<Appointment>>;

    /// Cancels one of the caller's own upcoming bookings, up to the cutoff.
    async fn cancel_own(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: CancelAppointmentRequest,
    ) -> TrimlyResult<Appointment>;
}

/// Where a new booking goes, before the staff and slot checks.
struct SlotRequest<'a> {
    salon: &'a Salon,
    staff_id: StaffId,
    service_ids: &'a [ServiceId],
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: i64,
    exclude: Option<AppointmentId>,
}

/// Appointment service implementation.
pub struct AppointmentServiceImpl {
    repos: Repositories,
    booking: BookingConfig,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<SalonId, Arc<AsyncMutex<()>>>>,
}

impl AppointmentServiceImpl {
    pub fn new(repos: Repositories, booking: BookingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            booking,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_salon(&self, salon_id: SalonId) -> OwnedMutexGuard<()> {
        let lock = self.locks.lock().entry(salon_id).or_default().clone();
        lock.lock_owned().await
    }

    async fn load(&self, id: AppointmentId) -> TrimlyResult<Appointment> {
        self.repos
            .appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Appointment", id))
    }

    /// Loads an appointment the caller may act on, with its salon.
    async fn appointment_for(&self, claims: &Claims, id: AppointmentId) -> TrimlyResult<(Appointment, Salon)> {
        let appointment = self.load(id).await?;
        let salon = scope::salon_for(&self.repos, claims, appointment.salon_id).await?;
        if let Some(own) = self.own_staff_id(claims).await? {
            if appointment.staff_id != own {
                return Err(TrimlyError::forbidden("Staff can only see their own appointments"));
            }
        }
        Ok((appointment, salon))
    }

    /// The staff record of a staff-role caller, when one is linked.
    async fn own_staff_id(&self, claims: &Claims) -> TrimlyResult<Option<StaffId>> {
        if claims.role != UserRole::Staff {
            return Ok(None);
        }
        match claims.user_id() {
            Some(user_id) => Ok(self.repos.staff.find_by_user(user_id).await?.map(|s| s.id)),
            None => Ok(None),
        }
    }

    async fn bundle(&self, salon: &Salon, service_ids: &[ServiceId]) -> TrimlyResult<scheduling::ServiceBundle> {
        let found = self.repos.services.find_by_ids(service_ids).await?;
        scheduling::bundle_services(salon.id, service_ids, &found)
    }

    /// Runs the date, hours, staff, and overlap checks in reporting order.
    async fn check_slot(&self, request: SlotRequest<'_>) -> TrimlyResult<TimeSlot> {
        let salon = request.salon;
        scheduling::check_open_on(salon, request.date)?;
        scheduling::check_booking_window(
            salon,
            request.date,
            request.start,
            self.clock.now(),
            self.booking.max_advance_days,
        )?;
        let slot = scheduling::slot_in_hours(salon, request.start, request.duration_minutes)?;

        let staff = self
            .repos
            .staff
            .find_by_id(request.staff_id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Staff", request.staff_id))?;
        let attendance = self.repos.attendance.find_by_staff_on(staff.id, request.date).await?;
        scheduling::check_staff_eligible(salon, &staff, request.date, attendance.as_ref(), request.service_ids)?;

        let booked = self.repos.appointments.find_by_staff_on(staff.id, request.date).await?;
        scheduling::check_no_overlap(&slot, &booked, request.exclude)?;
        Ok(slot)
    }

    /// Staff able to take `services` on `date`, with their day's bookings.
    /// A staff member asked for by id who cannot take them is an error.
    async fn candidates(
        &self,
        salon: &Salon,
        date: NaiveDate,
        services: &[ServiceId],
        only: Option<StaffId>,
    ) -> TrimlyResult<Vec<StaffDay>> {
        let roster: Vec<Staff> = match only {
            Some(id) => {
                let staff = self
                    .repos
                    .staff
                    .find_by_id(id)
                    .await?
                    .filter(|s| s.salon_id == salon.id)
                    .ok_or_else(|| TrimlyError::not_found("Staff", id))?;
                vec![staff]
            }
            None => self.repos.staff.find_by_salon(salon.id, Some(true)).await?,
        };

        let mut days = Vec::with_capacity(roster.len());
        for staff in roster {
            let attendance = self.repos.attendance.find_by_staff_on(staff.id, date).await?;
            if let Err(err) = scheduling::check_staff_eligible(salon, &staff, date, attendance.as_ref(), services) {
                if only.is_some() {
                    return Err(err);
                }
                continue;
            }
            let appointments = self.repos.appointments.find_by_staff_on(staff.id, date).await?;
            days.push(StaffDay { staff, appointments });
        }
        Ok(days)
    }
}

fn ensure_accepting(salon: &Salon) -> TrimlyResult<()> {
    if !salon.is_active {
        return Err(TrimlyError::business_rule(format!(
            "Salon '{}' is not accepting bookings",
            salon.name
        )));
    }
    Ok(())
}

fn ensure_upcoming(appointment: &Appointment) -> TrimlyResult<()> {
    if !appointment.status.is_upcoming() {
        return Err(TrimlyError::business_rule(format!(
            "A {} appointment can no longer be changed",
            appointment.status
        )));
    }
    Ok(())
}

#[async_trait]
impl AppointmentService for AppointmentServiceImpl {
    async fn book(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        request: BookAppointmentRequest,
    ) -> TrimlyResult<Appointment> {
        debug!("Booking staff {} at salon {} on {}", request.staff_id, salon_id, request.date);
        claims.require_permission(Permission::AppointmentManage)?;
        request.validate_request()?;

        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        ensure_accepting(&salon)?;
        if let Some(customer_id) = request.customer_id {
            if self.repos.customers.find_by_id(customer_id).await?.is_none() {
                return Err(TrimlyError::not_found("Customer", customer_id));
            }
        }
        let phone = request.customer_phone.as_deref().map(normalize_phone).transpose()?;

        let _guard = self.lock_salon(salon.id).await;
        let bundle = self.bundle(&salon, &request.service_ids).await?;
        let slot = self
            .check_slot(SlotRequest {
                salon: &salon,
                staff_id: request.staff_id,
                service_ids: &bundle.service_ids,
                date: request.date,
                start: request.start_time,
                duration_minutes: bundle.duration_minutes,
                exclude: None,
            })
            .await?;

        let mut appointment = Appointment::new(
            salon.id,
            request.staff_id,
            bundle.service_ids,
            request.date,
            slot,
            bundle.total_price,
            CustomerDetails {
                customer_id: request.customer_id,
                name: request.customer_name.trim().to_string(),
                phone,
            },
            AppointmentKind::Scheduled,
            self.clock.now(),
        );
        appointment.notes = request.notes;
        appointment.created_by = claims.user_id();

        let saved = self.repos.appointments.save(&appointment).await?;
        info!(
            "Appointment {} booked with staff {} on {} at {}",
            saved.id, saved.staff_id, saved.date, saved.start_time
        );
        Ok(saved)
    }

    async fn walk_in(&self, claims: &Claims, salon_id: SalonId, request: WalkInRequest) -> TrimlyResult<Appointment> {
        claims.require_permission(Permission::AppointmentManage)?;
        request.validate_request()?;

        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;
        ensure_accepting(&salon)?;
        let phone = request.customer_phone.as_deref().map(normalize_phone).transpose()?;

        let _guard = self.lock_salon(salon.id).await;
        let bundle = self.bundle(&salon, &request.service_ids).await?;
        let now = self.clock.now();
        let local = salon.local_time(now);
        let today = local.date();
        scheduling::check_open_on(&salon, today)?;

        let candidates = self.candidates(&salon, today, &bundle.service_ids, request.staff_id).await?;
        let (staff_id, slot) = scheduling::allocate_walk_in(&salon, bundle.duration_minutes, &candidates, local.time())
            .ok_or_else(|| TrimlyError::business_rule("No staff member is free before closing today"))?;

        let mut appointment = Appointment::new(
            salon.id,
            staff_id,
            bundle.service_ids,
            today,
            slot,
            bundle.total_price,
            CustomerDetails {
                customer_id: None,
                name: request
                    .customer_name
                    .map_or_else(|| "Walk-in".to_string(), |n| n.trim().to_string()),
                phone,
            },
            AppointmentKind::WalkIn,
            now,
        );
        appointment.notes = request.notes;
        appointment.created_by = claims.user_id();

        let saved = self.repos.appointments.save(&appointment).await?;
        info!(
            "Walk-in {} seated with staff {} at {}",
            saved.id, saved.staff_id, saved.start_time
        );
        Ok(saved)
    }

    async fn available_slots(&self, salon_id: SalonId, query: SlotQuery) -> TrimlyResult<Vec<AvailableSlot>> {
        let salon = scope::bookable_salon(&self.repos, salon_id).await?;
        let bundle = self.bundle(&salon, &query.service_ids).await?;

        let local_now = salon.local_time(self.clock.now());
        let not_before = match query.date.cmp(&local_now.date()) {
            std::cmp::Ordering::Less => return Ok(Vec::new()),
            std::cmp::Ordering::Equal => Some(local_now.time()),
            std::cmp::Ordering::Greater => None,
        };
        if scheduling::check_open_on(&salon, query.date).is_err()
            || query.date > local_now.date() + Duration::days(self.booking.max_advance_days)
        {
            return Ok(Vec::new());
        }

        let candidates = match self
            .candidates(&salon, query.date, &bundle.service_ids, query.staff_id)
            .await
        {
            // A named staff member who cannot take the services has no slots.
            Err(TrimlyError::BusinessRule(_)) => return Ok(Vec::new()),
            other => other?,
        };
        Ok(scheduling::available_slots(
            &salon,
            bundle.duration_minutes,
            &candidates,
            not_before,
        ))
    }

    async fn get_appointment(&self, claims: &Claims, id: AppointmentId) -> TrimlyResult<Appointment> {
        claims.require_permission(Permission::AppointmentManage)?;
        self.appointment_for(claims, id).await.map(|(appointment, _)| appointment)
    }

    async fn list_appointments(
        &self,
        claims: &Claims,
        salon_id: SalonId,
        query: AppointmentQuery,
        page: PageRequest,
    ) -> TrimlyResult<Page<Appointment>> {
        claims.require_permission(Permission::AppointmentManage)?;
        let salon = scope::salon_for(&self.repos, claims, salon_id).await?;

        let staff_id = match self.own_staff_id(claims).await? {
            Some(own) => Some(own),
            None => query.staff_id,
        };
        let filter = AppointmentFilter {
            salon_id: salon.id,
            date: query.date,
            staff_id,
            status: query.status,
        };
        self.repos.appointments.find_filtered(filter, page).await
    }

    async fn reschedule(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: RescheduleRequest,
    ) -> TrimlyResult<Appointment> {
        claims.require_permission(Permission::AppointmentManage)?;
        let (_, salon) = self.appointment_for(claims, id).await?;
        ensure_accepting(&salon)?;

        let _guard = self.lock_salon(salon.id).await;
        let mut appointment = self.load(id).await?;
        ensure_upcoming(&appointment)?;

        let staff_id = request.staff_id.unwrap_or(appointment.staff_id);
        let slot = self
            .check_slot(SlotRequest {
                salon: &salon,
                staff_id,
                service_ids: &appointment.service_ids,
                date: request.date,
                start: request.start_time,
                duration_minutes: appointment.slot().minutes(),
                exclude: Some(appointment.id),
            })
            .await?;

        appointment.reschedule(staff_id, request.date, slot, self.clock.now());
        let updated = self.repos.appointments.update(&appointment).await?;
        info!(
            "Appointment {} moved to {} at {} with staff {}",
            id, updated.date, updated.start_time, updated.staff_id
        );
        Ok(updated)
    }

    async fn update_status(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: UpdateAppointmentStatusRequest,
    ) -> TrimlyResult<Appointment> {
        claims.require_permission(Permission::AppointmentManage)?;
        let (mut appointment, _) = self.appointment_for(claims, id).await?;
        appointment.transition(request.status, self.clock.now())?;

        let updated = self.repos.appointments.update(&appointment).await?;
        info!("Appointment {} is now {}", id, updated.status);
        Ok(updated)
    }

    async fn cancel(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: CancelAppointmentRequest,
    ) -> TrimlyResult<Appointment> {
        claims.require_permission(Permission::AppointmentManage)?;
        request.validate_request()?;
        let (mut appointment, _) = self.appointment_for(claims, id).await?;
        appointment.cancel(request.reason, self.clock.now())?;

        let updated = self.repos.appointments.update(&appointment).await?;
        info!("Appointment {} cancelled", id);
        Ok(updated)
    }

    async fn customer_book(&self, claims: &Claims, request: CustomerBookingRequest) -> TrimlyResult<Appointment> {
        let customer_id = claims.require_customer()?;
        request.validate_request()?;
        debug!("Customer {} booking at salon {}", customer_id, request.salon_id);

        let customer = self
            .repos
            .customers
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Customer", customer_id))?;
        let salon = scope::bookable_salon(&self.repos, request.salon_id).await?;

        let _guard = self.lock_salon(salon.id).await;
        let bundle = self.bundle(&salon, &request.service_ids).await?;
        let slot = self
            .check_slot(SlotRequest {
                salon: &salon,
                staff_id: request.staff_id,
                service_ids: &bundle.service_ids,
                date: request.date,
                start: request.start_time,
                duration_minutes: bundle.duration_minutes,
                exclude: None,
            })
            .await?;

        let mut appointment = Appointment::new(
            salon.id,
            request.staff_id,
            bundle.service_ids,
            request.date,
            slot,
            bundle.total_price,
            CustomerDetails {
                customer_id: Some(customer.id),
                name: customer.name.clone().unwrap_or_else(|| customer.phone.clone()),
                phone: Some(customer.phone.clone()),
            },
            AppointmentKind::Scheduled,
            self.clock.now(),
        );
        appointment.notes = request.notes;

        let saved = self.repos.appointments.save(&appointment).await?;
        info!("Customer {} booked appointment {}", customer.id, saved.id);
        Ok(saved)
    }

    async fn my_appointments(&self, claims: &Claims, page: PageRequest) -> TrimlyResult<Page<Appointment>> {
        let customer_id = claims.require_customer()?;
        self.repos.appointments.find_by_customer(customer_id, page).await
    }

    async fn cancel_own(
        &self,
        claims: &Claims,
        id: AppointmentId,
        request: CancelAppointmentRequest,
    ) -> TrimlyResult<Appointment> {
        let customer_id = claims.require_customer()?;
        request.validate_request()?;

        let mut appointment = self.load(id).await?;
        if appointment.customer_id != Some(customer_id) {
            return Err(TrimlyError::not_found("Appointment", id));
        }
        ensure_upcoming(&appointment)?;

        let salon = self
            .repos
            .salons
            .find_by_id(appointment.salon_id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Salon", appointment.salon_id))?;
        let now = self.clock.now();
        let starts_at = salon.to_utc(appointment.date.and_time(appointment.start_time));
        let cutoff = self.booking.customer_cancel_cutoff_minutes;
        if starts_at - now <= Duration::minutes(cutoff) {
            return Err(TrimlyError::business_rule(format!(
                "Bookings can only be cancelled more than {cutoff} minutes before the start"
            )));
        }

        appointment.cancel(request.reason, now)?;
        let updated = self.repos.appointments.update(&appointment).await?;
        info!("Customer {} cancelled appointment {}", customer_id, id);
        Ok(updated)
    }
}

impl std::fmt::Debug for AppointmentServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppointmentServiceImpl")
            .field("booking", &self.booking)
            .finish_non_exhaustive()
    }
}
