//! Fixtures for service tests: in-memory storage, a fixed clock, and helpers
//! that create tenants, salons, staff, and customers.

use crate::dto::{BookAppointmentRequest, CreateSalonRequest, CreateServiceRequest, CreateStaffRequest};
use crate::otp_sender::{LoggingOtpSender, OtpSender};
use crate::registry::Services;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use trimly_config::AppConfig;
use trimly_core::{
    Appointment, Clock, Customer, Email, FixedClock, Salon, SalonService, ServiceId, Staff, User, UserRole, WeekdaySet,
};
use trimly_repository::Repositories;
use trimly_security::{Claims, PasswordHasher, TokenSubject, TokenType};

/// Password of every account created by the fixtures.
pub(crate) const PASSWORD: &str = "Secret-pass-1";

/// Salon open 09:00 to 19:00, Monday to Saturday, on a 15 minute grid, in UTC.
pub(crate) fn salon_request() -> CreateSalonRequest {
    CreateSalonRequest {
        name: "Glow Studio".to_string(),
        address: Some("12 MG Road".to_string()),
        phone: None,
        email: None,
        opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        closing_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        working_days: Some(WeekdaySet::MON_TO_SAT.iter().collect()),
        slot_interval_minutes: Some(15),
        utc_offset_minutes: 0,
    }
}

pub(crate) fn staff_request(name: &str) -> CreateStaffRequest {
    CreateStaffRequest {
        name: name.to_string(),
        phone: None,
        email: None,
        designation: Some("Stylist".to_string()),
        weekly_off: Vec::new(),
        joined_on: None,
        user_id: None,
        service_ids: Vec::new(),
    }
}

pub(crate) fn service_request(name: &str, minutes: i32, price: Decimal) -> CreateServiceRequest {
    CreateServiceRequest {
        name: name.to_string(),
        description: None,
        category_id: None,
        duration_minutes: minutes,
        price,
        staff_ids: Vec::new(),
    }
}

pub(crate) struct TestContext {
    pub repos: Repositories,
    /// Starts on Monday 2025-03-10 at 08:00 UTC.
    pub clock: Arc<FixedClock>,
    pub config: AppConfig,
    pub services: Services,
    hasher: PasswordHasher,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_otp_sender(Arc::new(LoggingOtpSender))
    }

    pub fn with_otp_sender(sender: Arc<dyn OtpSender>) -> Self {
        let config = AppConfig::default();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()));
        let repos = Repositories::in_memory();
        let services = Services::new(
            repos.clone(),
            &config,
            Arc::clone(&clock) as Arc<dyn Clock>,
            sender,
            PasswordHasher::lightweight(),
        );
        Self {
            repos,
            clock,
            config,
            services,
            hasher: PasswordHasher::lightweight(),
        }
    }

    /// A second service stack over the same storage, with its own in-process
    /// state, as another server process would have.
    pub fn sibling(&self) -> Services {
        Services::new(
            self.repos.clone(),
            &self.config,
            Arc::clone(&self.clock) as Arc<dyn Clock>,
            Arc::new(LoggingOtpSender),
            PasswordHasher::lightweight(),
        )
    }

    pub fn claims_for(&self, user: &User) -> Claims {
        Claims::new(
            &TokenSubject::for_user(user),
            TokenType::Access,
            "trimly".to_string(),
            "trimly-api".to_string(),
            self.clock.now() + Duration::hours(1),
        )
    }

    /// A tenant on a fresh trial.
    pub async fn admin(&self, email: &str) -> (User, Claims) {
        let user = User::new_admin(
            display_name(email),
            Email::new(email).unwrap(),
            self.hasher.hash(PASSWORD).unwrap(),
            None,
            self.clock.now(),
            self.config.subscription.trial_days,
        );
        let user = self.repos.users.save(&user).await.unwrap();
        let claims = self.claims_for(&user);
        (user, claims)
    }

    pub async fn super_admin(&self) -> Claims {
        let user = User::new_super_admin(
            "Operator".to_string(),
            Email::new("ops@trimly.example").unwrap(),
            self.hasher.hash(PASSWORD).unwrap(),
            self.clock.now(),
        );
        let user = self.repos.users.save(&user).await.unwrap();
        self.claims_for(&user)
    }

    /// A salon of the tenant behind `admin`, built from [`salon_request`].
    pub async fn salon(&self, admin: &Claims) -> Salon {
        self.services.salons.create_salon(admin, salon_request()).await.unwrap()
    }

    /// A manager or staff login bound to `salon`.
    pub async fn employee(&self, _admin: &Claims, salon: &Salon, role: UserRole, email: &str) -> (User, Claims) {
        let user = User::new_employee(
            salon.owner_id,
            salon.id,
            role,
            display_name(email),
            Email::new(email).unwrap(),
            self.hasher.hash(PASSWORD).unwrap(),
            None,
            self.clock.now(),
        );
        let user = self.repos.users.save(&user).await.unwrap();
        let claims = self.claims_for(&user);
        (user, claims)
    }

    pub async fn service(
        &self,
        admin: &Claims,
        salon: &Salon,
        name: &str,
        minutes: i32,
        price: Decimal,
    ) -> SalonService {
        self.services
            .catalog
            .create_service(admin, salon.id, service_request(name, minutes, price))
            .await
            .unwrap()
    }

    pub async fn staff(&self, admin: &Claims, salon: &Salon, name: &str, services: &[ServiceId]) -> Staff {
        let request = CreateStaffRequest {
            service_ids: services.to_vec(),
            ..staff_request(name)
        };
        self.services.staff.create_staff(admin, salon.id, request).await.unwrap()
    }

    /// A signed-up customer and their access claims.
    /// Books one service with `staff` for a walk-up guest.
    pub async fn booking(
        &self,
        admin: &Claims,
        salon: &Salon,
        staff: &Staff,
        service: &SalonService,
        date: NaiveDate,
        start: NaiveTime,
    ) -> Appointment {
        self.services
            .appointments
            .book(
                admin,
                salon.id,
                BookAppointmentRequest {
                    staff_id: staff.id,
                    service_ids: vec![service.id],
                    date,
                    start_time: start,
                    customer_id: None,
                    customer_name: "Priya".to_string(),
                    customer_phone: None,
                    notes: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn customer(&self, phone: &str) -> (Customer, Claims) {
        let customer = Customer::new(phone.to_string(), Some("Priya".to_string()), None, self.clock.now());
        let customer = self.repos.customers.save(&customer).await.unwrap();
        let claims = Claims::new(
            &TokenSubject::for_customer(&customer),
            TokenType::Access,
            "trimly".to_string(),
            "trimly-api".to_string(),
            self.clock.now() + Duration::hours(1),
        );
        (customer, claims)
    }
}

fn display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
