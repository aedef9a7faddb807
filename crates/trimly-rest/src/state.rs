//! Application state for Axum handlers.

use std::sync::Arc;
use trimly_core::HealthCheck;
use trimly_service::Services;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Dependencies probed by `/ready`.
    pub readiness: Arc<Vec<Arc<dyn HealthCheck>>>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(services: Services) -> Self {
        Self {
            services,
            readiness: Arc::new(Vec::new()),
        }
    }

    /// Adds a dependency that must be healthy for the server to be ready.
    #[must_use]
    pub fn with_readiness_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        Arc::make_mut(&mut self.readiness).push(check);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("readiness_checks", &self.readiness.len())
            .finish_non_exhaustive()
    }
}
