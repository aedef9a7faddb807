//! Subscription gating of tenant routes.

use crate::{responses::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;
use trimly_security::Claims;

/// Applies the caller's tenant window to the request.
///
/// Safe methods are allowed under a read-only demo window; everything else
/// needs a trial or paid plan. Super admins and customers are not gated, and
/// unauthenticated requests are left for the handler to reject.
pub async fn access_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // The body is not `Sync`, so nothing borrowed from the request may live
    // across the await.
    if let Some(claims) = request.extensions().get::<Claims>().cloned() {
        let method = request.method().clone();
        if let Err(e) = state
            .services
            .access
            .authorize_request(&claims, is_read_only(&method))
            .await
        {
            debug!("Access denied for {} on {} {}: {}", claims.sub, method, request.uri().path(), e);
            return AppError(e).into_response();
        }
    }

    next.run(request).await
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}
