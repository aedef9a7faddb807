//! JWT claims structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trimly_core::{Customer, CustomerId, SalonId, TenantId, User, UserId, UserRole};
use uuid::Uuid;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: a user id, or a customer id when `role` is `customer`.
    pub sub: String,

    /// Display name.
    pub name: String,

    /// Principal's role.
    pub role: UserRole,

    /// Owning tenant for admins, managers, and staff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,

    /// Salon a manager or staff account is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<Uuid>,

    /// Token type (access or refresh).
    pub token_type: TokenType,

    /// Issued at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Not before timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: String,

    /// JWT ID (unique identifier for this token).
    pub jti: String,
}

/// Who a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub tenant_id: Option<TenantId>,
    pub salon_id: Option<SalonId>,
}

impl TokenSubject {
    /// Subject for a staff-side account.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            id: user.id.into_inner(),
            name: user.name.clone(),
            role: user.role,
            tenant_id: user.tenant_id,
            salon_id: user.salon_id,
        }
    }

    /// Subject for a customer.
    #[must_use]
    pub fn for_customer(customer: &Customer) -> Self {
        Self {
            id: customer.id.into_inner(),
            name: customer.name.clone().unwrap_or_default(),
            role: UserRole::Customer,
            tenant_id: None,
            salon_id: None,
        }
    }
}

impl Claims {
    /// Creates claims for `subject`.
    #[must_use]
    pub fn new(
        subject: &TokenSubject,
        token_type: TokenType,
        issuer: String,
        audience: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.id.to_string(),
            name: subject.name.clone(),
            role: subject.role,
            tenant_id: subject.tenant_id.map(TenantId::into_inner),
            salon_id: subject.salon_id.map(SalonId::into_inner),
            token_type,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: Some(now.timestamp()),
            iss: issuer,
            aud: audience,
            jti: Uuid::now_v7().to_string(),
        }
    }

    fn subject_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// The staff-side account id; `None` for customers.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        if self.is_customer() {
            return None;
        }
        self.subject_uuid().map(UserId::from_uuid)
    }

    /// The customer id; `None` for staff-side accounts.
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        if !self.is_customer() {
            return None;
        }
        self.subject_uuid().map(CustomerId::from_uuid)
    }

    /// The tenant this principal acts for.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id.map(TenantId::from_uuid)
    }

    /// The salon an employee is bound to.
    #[must_use]
    pub fn salon_id(&self) -> Option<SalonId> {
        self.salon_id.map(SalonId::from_uuid)
    }

    #[must_use]
    pub const fn is_customer(&self) -> bool {
        matches!(self.role, UserRole::Customer)
    }

    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self.role, UserRole::SuperAdmin)
    }

    /// Checks if the token is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks if the principal has the required role.
    #[must_use]
    pub const fn has_role(&self, required: UserRole) -> bool {
        self.role.has_permission(required)
    }

    /// Checks if this is an access token.
    #[must_use]
    pub const fn is_access_token(&self) -> bool {
        matches!(self.token_type, TokenType::Access)
    }

    /// Checks if this is a refresh token.
    #[must_use]
    pub const fn is_refresh_token(&self) -> bool {
        matches!(self.token_type, TokenType::Refresh)
    }
}

/// Token type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Access token (short-lived, used for API requests).
    Access,
    /// Refresh token (long-lived, used to obtain new access tokens).
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subject(role: UserRole) -> TokenSubject {
        let id = Uuid::now_v7();
        TokenSubject {
            id,
            name: "Priya".to_string(),
            role,
            tenant_id: Some(TenantId::from_uuid(id)),
            salon_id: None,
        }
    }

    fn claims(subject: &TokenSubject) -> Claims {
        Claims::new(
            subject,
            TokenType::Access,
            "issuer".to_string(),
            "audience".to_string(),
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn test_access_token_claims() {
        let claims = claims(&subject(UserRole::Admin));
        assert!(claims.is_access_token());
        assert!(!claims.is_refresh_token());
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_principal_ids() {
        let admin = subject(UserRole::Admin);
        let admin_claims = claims(&admin);
        assert_eq!(admin_claims.user_id().map(UserId::into_inner), Some(admin.id));
        assert!(admin_claims.customer_id().is_none());
        assert_eq!(admin_claims.tenant_id().map(TenantId::into_inner), Some(admin.id));

        let customer = subject(UserRole::Customer);
        let customer_claims = claims(&customer);
        assert!(customer_claims.user_id().is_none());
        assert_eq!(
            customer_claims.customer_id().map(CustomerId::into_inner),
            Some(customer.id)
        );
    }

    #[test]
    fn test_role_check() {
        let claims = claims(&subject(UserRole::Manager));
        assert!(claims.has_role(UserRole::Staff));
        assert!(claims.has_role(UserRole::Manager));
        assert!(!claims.has_role(UserRole::Admin));
    }
}
