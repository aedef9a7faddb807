//! Authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use trimly_security::TokenProvider;

/// Authentication middleware state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub token_provider: Arc<TokenProvider>,
}

impl AuthMiddlewareState {
    pub fn new(token_provider: Arc<TokenProvider>) -> Self {
        Self { token_provider }
    }
}

/// Validates a bearer access token and stores its claims in the request
/// extensions.
///
/// Requests without a valid token pass through unauthenticated; handlers that
/// need a caller reject them through `AuthenticatedUser`.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.token_provider.validate_access_token(&token) {
            Ok(claims) => {
                debug!("Authenticated {} ({})", claims.sub, claims.role);
                request.extensions_mut().insert(claims);
            }
            Err(e) => {
                warn!("Rejected bearer token on {}: {}", request.uri().path(), e);
            }
        }
    }

    next.run(request).await
}
