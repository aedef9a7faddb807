//! JWT claims extractor.

use crate::responses::AppError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use trimly_core::TrimlyError;
use trimly_security::Claims;

/// Extractor for the authenticated caller's claims.
///
/// The auth middleware validates the bearer token and stores the claims in
/// the request extensions; this extractor only reads them back.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl std::ops::Deref for AuthenticatedUser {
    type Target = Claims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(Self(claims.clone()));
        }

        let message = match parts.headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
            None => "Missing authorization header",
            Some(header) if !header.starts_with("Bearer ") => "Invalid authorization format",
            Some(_) => "Invalid or expired token",
        };
        Err(AppError(TrimlyError::unauthorized(message)))
    }
}
