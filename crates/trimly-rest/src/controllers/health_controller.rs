//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use trimly_core::HealthStatus;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Application version.
    pub version: String,
}

/// One dependency probed by the readiness check.
#[derive(Debug, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub dependencies: Vec<DependencyStatus>,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check endpoint. Answers 503 while any dependency is unhealthy.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let mut dependencies = Vec::with_capacity(state.readiness.len());
    for check in state.readiness.iter() {
        let status = check.check().await;
        let detail = match &status {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => Some(reason.clone()),
        };
        if status.is_unhealthy() {
            warn!("Readiness check {} failed: {:?}", check.name(), detail);
        }
        dependencies.push(DependencyStatus {
            name: check.name().to_string(),
            healthy: !status.is_unhealthy(),
            detail,
        });
    }

    let ready = dependencies.iter().all(|d| d.healthy);
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(ReadinessResponse { ready, dependencies }))
}

/// Liveness check endpoint.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
