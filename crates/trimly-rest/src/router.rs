//! Main application router.

use crate::{
    controllers::{
        appointment_controller, attendance_controller, auth_controller, catalog_controller, customer_controller,
        expense_controller, health_controller, inventory_controller, plan_controller, salon_controller,
        staff_controller, subscription_controller, user_controller,
    },
    middleware::{access_middleware, auth_middleware, logging_middleware, AuthMiddlewareState},
    state::AppState,
};
use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use trimly_config::ServerConfig;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Creates the main application router.
///
/// Tenant back-office routes are gated by the caller's subscription window.
/// Sign-in, plan listing, the subscription endpoints, customer self-service,
/// and the public booking catalog are not.
pub fn create_router(state: AppState, server_config: &ServerConfig) -> Router {
    let auth_state = AuthMiddlewareState::new(state.services.token_provider.clone());

    let tenant_routes = Router::new()
        .nest("/users", user_controller::router())
        .merge(salon_controller::router())
        .merge(staff_controller::router())
        .merge(catalog_controller::router())
        .merge(appointment_controller::router())
        .merge(attendance_controller::router())
        .merge(inventory_controller::router())
        .merge(expense_controller::router())
        .layer(middleware::from_fn_with_state(state.clone(), access_middleware));

    let open_routes = Router::new()
        .nest("/auth", auth_controller::router())
        .nest("/customers", customer_controller::router())
        .nest("/plans", plan_controller::router())
        .nest("/subscription", subscription_controller::router())
        .nest("/tenants", subscription_controller::tenant_router())
        .nest("/public", public_routes());

    let api_router = Router::new()
        .merge(tenant_routes)
        .merge(open_routes)
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let router = Router::new()
        .merge(health_controller::router())
        .nest("/api/v1", api_router)
        .route("/", get(root))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(server_config))
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid));

    info!("Router created with REST endpoints under /api/v1");
    router
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_controller::public_router())
        .merge(appointment_controller::public_router())
}

/// Creates a CORS layer from the configured origins; `*` allows any origin.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if server_config.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Root endpoint handler.
async fn root() -> &'static str {
    "Trimly API v1"
}

#[cfg(test)]
mod tests {
    use crate::test_support::{TestApp, PASSWORD};
    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Arc;
    use trimly_core::{HealthCheck, HealthStatus};

    struct DatabaseDown;

    #[async_trait]
    impl HealthCheck for DatabaseDown {
        fn name(&self) -> &str {
            "database"
        }

        async fn check(&self) -> HealthStatus {
            HealthStatus::Unhealthy("connection refused".to_string())
        }
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = TestApp::new();

        let (status, body) = app.get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = app.get("/live", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.get("/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }

    #[tokio::test]
    async fn test_readiness_reports_failed_dependency() {
        let app = TestApp::with_state(|state| state.with_readiness_check(Arc::new(DatabaseDown)));

        let (status, body) = app.get("/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
        assert_eq!(body["dependencies"][0]["name"], "database");
        assert_eq!(body["dependencies"][0]["detail"], "connection refused");
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = TestApp::new();
        app.register_owner("asha@glow.example").await;

        let token = app.login("asha@glow.example", PASSWORD).await;
        let (status, body) = app.get("/api/v1/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["email"], "asha@glow.example");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = TestApp::new();
        app.register_owner("asha@glow.example").await;

        let (status, body) = app
            .post(
                "/api/v1/auth/login",
                None,
                json!({ "email": "asha@glow.example", "password": "Wrong-pass-1" }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_with_envelope() {
        let app = TestApp::new();

        let (status, body) = app.get("/api/v1/salons", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = app.get("/api/v1/auth/me", Some("not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_validation_errors_list_fields() {
        let app = TestApp::new();

        let (status, body) = app
            .post(
                "/api/v1/auth/register",
                None,
                json!({ "name": "Asha", "email": "not-an-email", "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let details = body["error"]["details"].as_array().unwrap();
        assert!(details.iter().any(|d| d["field"] == "email"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let app = TestApp::new();
        let (token, _) = app.register_owner("asha@glow.example").await;

        let (status, body) = app.get("/api/v1/salons/not-a-uuid", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_slot_query_uses_envelope() {
        let app = TestApp::new();
        let (token, _) = app.register_owner("asha@glow.example").await;
        let salon = app.create_salon(&token).await;

        for query in ["date=tomorrow", "date=2025-03-11&staff_id=ravi", ""] {
            let (status, body) = app
                .get(&format!("/api/v1/public/salons/{salon}/slots?{query}"), None)
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
            assert_eq!(body["success"], false);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{query}");
        }
    }

    #[tokio::test]
    async fn test_expired_trial_blocks_back_office_only() {
        let app = TestApp::new();
        let (token, _) = app.register_owner("asha@glow.example").await;
        app.create_salon(&token).await;

        app.clock.advance(Duration::days(15));

        let (status, body) = app.get("/api/v1/salons", Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "SUBSCRIPTION_EXPIRED");

        let (status, _) = app.get("/api/v1/subscription", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.get("/api/v1/plans", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.get("/api/v1/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_demo_grant_is_read_only() {
        let app = TestApp::new();
        let (token, tenant) = app.register_owner("asha@glow.example").await;
        app.clock.advance(Duration::days(15));

        app.services
            .auth
            .ensure_super_admin("Root", "root@trimly.example", PASSWORD)
            .await
            .unwrap();
        let root = app.login("root@trimly.example", PASSWORD).await;

        let (status, body) = app
            .post(&format!("/api/v1/tenants/{tenant}/access"), Some(&root), json!({ "demo_days": 7 }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (status, _) = app.get("/api/v1/salons", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .post("/api/v1/salons", Some(&token), json!({
                "name": "Second Studio",
                "opening_time": "09:00:00",
                "closing_time": "19:00:00",
            }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "READ_ONLY_ACCESS");
    }

    #[tokio::test]
    async fn test_only_super_admin_grants_access() {
        let app = TestApp::new();
        let (token, tenant) = app.register_owner("asha@glow.example").await;

        let (status, _) = app
            .post(&format!("/api/v1/tenants/{tenant}/access"), Some(&token), json!({ "trial_days": 30 }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_customer_books_through_public_catalog() {
        let app = TestApp::new();
        let (token, _) = app.register_owner("asha@glow.example").await;
        let salon = app.create_salon(&token).await;

        let (status, body) = app
            .post(&format!("/api/v1/salons/{salon}/staff"), Some(&token), json!({ "name": "Meera" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let staff = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .post(
                &format!("/api/v1/salons/{salon}/services"),
                Some(&token),
                json!({ "name": "Haircut", "duration_minutes": 45, "price": "350.00", "staff_ids": [staff] }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let service = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = app.get(&format!("/api/v1/public/salons/{salon}/services"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let phone = "+919800000002";
        let (status, _) = app.post("/api/v1/customers/otp/request", None, json!({ "phone": phone })).await;
        assert_eq!(status, StatusCode::OK);
        let code = app.otp.last_code_for(phone).unwrap();

        let (status, body) = app
            .post(
                "/api/v1/customers/otp/verify",
                None,
                json!({ "phone": phone, "code": code, "name": "Kiran" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["is_new_customer"], true);
        let customer = body["data"]["access_token"].as_str().unwrap().to_string();

        let (status, body) = app.get("/api/v1/customers/me", Some(&customer)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["phone"], phone);

        let (status, body) = app
            .post(
                "/api/v1/customers/me/appointments",
                Some(&customer),
                json!({
                    "salon_id": salon,
                    "staff_id": staff,
                    "service_ids": [service],
                    "date": "2025-03-11",
                    "start_time": "10:00:00",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["end_time"], "10:45:00");

        let (status, body) = app
            .get(
                &format!("/api/v1/public/salons/{salon}/slots?date=2025-03-11&service_ids={service}"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let slots = body["data"].as_array().unwrap();
        assert!(!slots.is_empty());
        assert!(slots.iter().all(|slot| slot["start_time"] != "10:00:00"));

        let (status, body) = app.get("/api/v1/customers/me/appointments", Some(&customer)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_elements"], 1);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = TestApp::new();
        let (status, _) = app.send(Method::GET, "/api/v1/nowhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
