//! In-process application for router tests: in-memory storage, a pinned
//! clock, and an OTP sender that remembers what it delivered.

use crate::{create_router, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use trimly_config::AppConfig;
use trimly_core::{Clock, FixedClock, TrimlyResult};
use trimly_repository::Repositories;
use trimly_security::PasswordHasher;
use trimly_service::{OtpSender, Services};

pub(crate) const PASSWORD: &str = "Secret-pass-1";

/// Keeps every delivered passcode so tests can read it back.
#[derive(Debug, Default)]
pub(crate) struct RecordingOtpSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingOtpSender {
    pub fn last_code_for(&self, phone: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == phone)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl OtpSender for RecordingOtpSender {
    async fn send(&self, phone: &str, code: &str) -> TrimlyResult<()> {
        self.sent.lock().unwrap().push((phone.to_string(), code.to_string()));
        Ok(())
    }
}

pub(crate) struct TestApp {
    pub router: Router,
    /// Starts on Monday 2025-03-10 at 08:00 UTC.
    pub clock: Arc<FixedClock>,
    pub services: Services,
    pub otp: Arc<RecordingOtpSender>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_state(|state| state)
    }

    /// Builds the app, letting the caller adjust the state before routing.
    pub fn with_state(configure: impl FnOnce(AppState) -> AppState) -> Self {
        let config = AppConfig::default();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()));
        let otp = Arc::new(RecordingOtpSender::default());
        let services = Services::new(
            Repositories::in_memory(),
            &config,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&otp) as Arc<dyn OtpSender>,
            PasswordHasher::lightweight(),
        );
        let state = configure(AppState::new(services.clone()));
        let router = create_router(state, &config.server);

        Self {
            router,
            clock,
            services,
            otp,
        }
    }

    /// Sends one request and returns the status with the parsed body
    /// (`Value::Null` when the body is empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers a salon owner and returns their access token and tenant id.
    pub async fn register_owner(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/auth/register",
                None,
                serde_json::json!({
                    "name": "Asha Rao",
                    "email": email,
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let token = body["data"]["access_token"].as_str().unwrap().to_string();
        let tenant = body["data"]["user"]["id"].as_str().unwrap().to_string();
        (token, tenant)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/auth/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a salon open 09:00 to 19:00 in UTC and returns its id.
    pub async fn create_salon(&self, token: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/salons",
                Some(token),
                serde_json::json!({
                    "name": "Glow Studio",
                    "address": "12 MG Road",
                    "opening_time": "09:00:00",
                    "closing_time": "19:00:00",
                    "slot_interval_minutes": 15,
                    "utc_offset_minutes": 0,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
