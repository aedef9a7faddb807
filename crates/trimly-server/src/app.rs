//! Application builder.

use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};
use trimly_config::{AppConfig, BootstrapConfig};
use trimly_core::{Clock, HealthCheck, SystemClock, TrimlyError, TrimlyResult};
use trimly_repository::Repositories;
use trimly_rest::{create_router, AppState};
use trimly_security::PasswordHasher;
use trimly_service::{LoggingOtpSender, OtpSender, Services};

const DEFAULT_SUPER_ADMIN_NAME: &str = "Platform Admin";

/// A wired application, ready to serve.
pub struct App {
    pub config: AppConfig,
    pub services: Services,
    pub router: Router,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("environment", &self.config.app.environment)
            .finish_non_exhaustive()
    }
}

/// Application builder for constructing the server.
///
/// Storage must be supplied; the clock, passcode sender, and password hasher
/// default to their production implementations.
pub struct AppBuilder {
    config: Option<AppConfig>,
    repositories: Option<Repositories>,
    clock: Option<Arc<dyn Clock>>,
    otp_sender: Option<Arc<dyn OtpSender>>,
    password_hasher: Option<PasswordHasher>,
    readiness: Vec<Arc<dyn HealthCheck>>,
}

impl AppBuilder {
    /// Creates a new application builder.
    pub fn new() -> Self {
        Self {
            config: None,
            repositories: None,
            clock: None,
            otp_sender: None,
            password_hasher: None,
            readiness: Vec::new(),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_repositories(mut self, repositories: Repositories) -> Self {
        self.repositories = Some(repositories);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn with_otp_sender(mut self, sender: Arc<dyn OtpSender>) -> Self {
        self.otp_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn with_password_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = Some(hasher);
        self
    }

    /// Adds a dependency probed by `/ready`.
    #[must_use]
    pub fn with_readiness_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.readiness.push(check);
        self
    }

    /// Wires the services, seeds the platform operator, and builds the router.
    pub async fn build(self) -> TrimlyResult<App> {
        let config = self.config.unwrap_or_default();
        let repositories = self
            .repositories
            .ok_or_else(|| TrimlyError::Configuration("No storage configured".to_string()))?;

        let services = Services::new(
            repositories,
            &config,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.otp_sender.unwrap_or_else(|| Arc::new(LoggingOtpSender)),
            self.password_hasher.unwrap_or_default(),
        );

        bootstrap_super_admin(&services, &config.bootstrap).await?;

        let state = self
            .readiness
            .into_iter()
            .fold(AppState::new(services.clone()), AppState::with_readiness_check);
        let router = create_router(state, &config.server);

        Ok(App {
            config,
            services,
            router,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the configured super admin unless an account with that email
/// already exists. Returns whether an account was created.
pub async fn bootstrap_super_admin(services: &Services, bootstrap: &BootstrapConfig) -> TrimlyResult<bool> {
    let (email, password) = match (&bootstrap.super_admin_email, &bootstrap.super_admin_password) {
        (Some(email), Some(password)) => (email, password),
        (None, None) => return Ok(false),
        _ => {
            warn!("Super admin bootstrap needs both an email and a password; skipping");
            return Ok(false);
        }
    };

    let name = bootstrap
        .super_admin_name
        .as_deref()
        .unwrap_or(DEFAULT_SUPER_ADMIN_NAME);
    let created = services.auth.ensure_super_admin(name, email, password).await?;
    if created {
        info!("Super admin {} created", email);
    }
    Ok(created)
}
