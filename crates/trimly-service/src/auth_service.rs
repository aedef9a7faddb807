//! Authentication service for staff-side accounts.

use crate::dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RefreshTokenRequest,
    RegisterAdminRequest, UserResponse,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trimly_core::{
    normalize_phone, AccountStatus, Clock, Email, Interface, TrimlyError, TrimlyResult, User,
    ValidateExt,
};
use trimly_repository::UserRepository;
use trimly_security::{Claims, ClaimsExt, PasswordHasher, TokenProvider, TokenSubject};

/// Authentication service trait.
#[async_trait]
pub trait AuthService: Interface + Send + Sync {
    /// Signs up a tenant admin and starts their trial.
    async fn register_admin(&self, request: RegisterAdminRequest) -> TrimlyResult<AuthResponse>;

    /// Logs in a staff-side account.
    async fn login(&self, request: LoginRequest) -> TrimlyResult<AuthResponse>;

    /// Exchanges a refresh token for a new pair.
    async fn refresh_token(&self, request: RefreshTokenRequest) -> TrimlyResult<AuthResponse>;

    /// Validates an access token and returns its claims.
    async fn validate_token(&self, token: &str) -> TrimlyResult<Claims>;

    /// Account behind `claims`.
    async fn current_user(&self, claims: &Claims) -> TrimlyResult<UserResponse>;

    /// Changes the caller's password after checking the current one.
    async fn change_password(
        &self,
        claims: &Claims,
        request: ChangePasswordRequest,
    ) -> TrimlyResult<MessageResponse>;

    /// Creates the platform operator when no account uses `email` yet.
    /// Returns whether an account was created.
    async fn ensure_super_admin(&self, name: &str, email: &str, password: &str) -> TrimlyResult<bool>;
}

/// Authentication service implementation.
pub struct AuthServiceImpl {
    users: Arc<dyn UserRepository>,
    password_hasher: Arc<PasswordHasher>,
    token_provider: Arc<TokenProvider>,
    clock: Arc<dyn Clock>,
    trial_days: i64,
}

impl AuthServiceImpl {
    /// Creates a new authentication service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        token_provider: Arc<TokenProvider>,
        clock: Arc<dyn Clock>,
        trial_days: i64,
    ) -> Self {
        Self {
            users,
            password_hasher,
            token_provider,
            clock,
            trial_days,
        }
    }

    fn create_auth_response(&self, user: &User) -> TrimlyResult<AuthResponse> {
        let tokens = self.token_provider.generate_tokens(&TokenSubject::for_user(user))?;

        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.access_expires_in,
            user: UserResponse::from(user.clone()),
        })
    }

    async fn load_user(&self, claims: &Claims) -> TrimlyResult<User> {
        let user_id = claims.require_user()?;
        self.users
            .find_by_id(user_id)
            .await?
            .filter(|user| user.status != AccountStatus::Deleted)
            .ok_or_else(|| TrimlyError::not_found("User", user_id))
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register_admin(&self, request: RegisterAdminRequest) -> TrimlyResult<AuthResponse> {
        debug!("Registering tenant admin: {}", request.email);
        request.validate_request()?;

        let email = Email::new(&request.email)?;
        if self.users.exists_by_email(email.as_str()).await? {
            return Err(TrimlyError::conflict(format!(
                "Email '{}' already exists",
                request.email
            )));
        }
        let phone = request.phone.as_deref().map(normalize_phone).transpose()?;
        let password_hash = self.password_hasher.hash(&request.password)?;

        let user = User::new_admin(
            request.name.trim().to_string(),
            email,
            password_hash,
            phone,
            self.clock.now(),
            self.trial_days,
        );
        let saved = self.users.save(&user).await?;

        info!("Tenant admin registered: {}", saved.id);
        self.create_auth_response(&saved)
    }

    async fn login(&self, request: LoginRequest) -> TrimlyResult<AuthResponse> {
        debug!("Login attempt for: {}", request.email);
        request.validate_request()?;

        let user = self.users.find_by_email(&request.email).await?.ok_or_else(|| {
            warn!("Login failed: unknown email - {}", request.email);
            TrimlyError::InvalidCredentials
        })?;

        if !self.password_hasher.verify(&request.password, &user.password_hash)? {
            warn!("Login failed: invalid password - {}", user.id);
            return Err(TrimlyError::InvalidCredentials);
        }

        if !user.can_login() {
            warn!("Login failed: account {} - {}", user.status, user.id);
            return Err(match user.status {
                AccountStatus::Deleted => TrimlyError::InvalidCredentials,
                AccountStatus::Suspended => TrimlyError::forbidden("Account is suspended"),
                AccountStatus::Active => TrimlyError::forbidden("Account is not active"),
            });
        }

        let mut user = user;
        user.record_login(self.clock.now());
        let user = self.users.update(&user).await?;

        info!("User logged in: {}", user.id);
        self.create_auth_response(&user)
    }

    async fn refresh_token(&self, request: RefreshTokenRequest) -> TrimlyResult<AuthResponse> {
        debug!("Refreshing token");
        let claims = self.token_provider.validate_refresh_token(&request.refresh_token)?;

        let user_id = claims.user_id().ok_or_else(|| {
            TrimlyError::InvalidToken("Refresh token does not belong to a staff account".to_string())
        })?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| TrimlyError::InvalidToken("User no longer exists".to_string()))?;

        if !user.can_login() {
            return Err(TrimlyError::forbidden("Account is not active"));
        }

        info!("Token refreshed for user: {}", user.id);
        self.create_auth_response(&user)
    }

    async fn validate_token(&self, token: &str) -> TrimlyResult<Claims> {
        self.token_provider.validate_access_token(token)
    }

    async fn current_user(&self, claims: &Claims) -> TrimlyResult<UserResponse> {
        self.load_user(claims).await.map(UserResponse::from)
    }

    async fn change_password(
        &self,
        claims: &Claims,
        request: ChangePasswordRequest,
    ) -> TrimlyResult<MessageResponse> {
        request.validate_request()?;
        let mut user = self.load_user(claims).await?;

        if !self.password_hasher.verify(&request.current_password, &user.password_hash)? {
            warn!("Password change rejected for user: {}", user.id);
            return Err(TrimlyError::InvalidCredentials);
        }
        if request.current_password == request.new_password {
            return Err(TrimlyError::validation(
                "New password must differ from the current one",
            ));
        }

        let hash = self.password_hasher.hash(&request.new_password)?;
        user.update_password(hash, self.clock.now());
        self.users.update(&user).await?;

        info!("Password changed for user: {}", user.id);
        Ok(MessageResponse::new("Password changed"))
    }

    async fn ensure_super_admin(&self, name: &str, email: &str, password: &str) -> TrimlyResult<bool> {
        let email = Email::new(email)?;
        if self.users.exists_by_email(email.as_str()).await? {
            debug!("Super admin {} already present", email);
            return Ok(false);
        }
        let hash = self.password_hasher.hash(password)?;
        let user = User::new_super_admin(name.to_string(), email, hash, self.clock.now());
        let saved = self.users.save(&user).await?;
        info!("Super admin created: {}", saved.id);
        Ok(true)
    }
}

impl std::fmt::Debug for AuthServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServiceImpl")
            .field("trial_days", &self.trial_days)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestContext, PASSWORD};
    use trimly_core::UserRole;

    fn register(email: &str) -> RegisterAdminRequest {
        RegisterAdminRequest {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            phone: Some("+91 98000 00001".to_string()),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_starts_trial() {
        let ctx = TestContext::new();
        let response = ctx
            .services
            .auth
            .register_admin(register("asha@glow.example"))
            .await
            .unwrap();

        assert_eq!(response.user.role, UserRole::Admin);
        assert_eq!(response.user.tenant_id, Some(response.user.id));
        assert_eq!(response.user.phone.as_deref(), Some("+919800000001"));
        assert!(response.expires_in > 0);

        let stored = ctx.repos.users.find_by_id(response.user.id).await.unwrap().unwrap();
        assert_eq!(
            stored.subscription.trial_ends_at,
            Some(ctx.clock.now() + chrono::Duration::days(14))
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let ctx = TestContext::new();
        ctx.services.auth.register_admin(register("asha@glow.example")).await.unwrap();
        let err = ctx
            .services
            .auth
            .register_admin(register("asha@glow.example"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_login_records_last_login() {
        let ctx = TestContext::new();
        ctx.services.auth.register_admin(register("asha@glow.example")).await.unwrap();

        let response = ctx
            .services
            .auth
            .login(login("asha@glow.example", PASSWORD))
            .await
            .unwrap();
        assert_eq!(response.user.last_login_at, Some(ctx.clock.now()));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let ctx = TestContext::new();
        let auth = ctx.services.auth.clone();
        let registered = auth.register_admin(register("asha@glow.example")).await.unwrap();

        let unknown = auth.login(login("nobody@glow.example", PASSWORD)).await.unwrap_err();
        assert_eq!(unknown.error_code(), "INVALID_CREDENTIALS");

        let wrong = auth.login(login("asha@glow.example", "Wrong-pass-1")).await.unwrap_err();
        assert_eq!(wrong.error_code(), "INVALID_CREDENTIALS");

        let mut user = ctx.repos.users.find_by_id(registered.user.id).await.unwrap().unwrap();
        user.set_status(AccountStatus::Suspended, ctx.clock.now());
        ctx.repos.users.update(&user).await.unwrap();
        let suspended = auth.login(login("asha@glow.example", PASSWORD)).await.unwrap_err();
        assert_eq!(suspended.status_code(), 403);
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair() {
        let ctx = TestContext::new();
        let registered = ctx
            .services
            .auth
            .register_admin(register("asha@glow.example"))
            .await
            .unwrap();

        let refreshed = ctx
            .services
            .auth
            .refresh_token(RefreshTokenRequest {
                refresh_token: registered.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(refreshed.user.id, registered.user.id);

        let err = ctx
            .services
            .auth
            .refresh_token(RefreshTokenRequest {
                refresh_token: registered.access_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_change_password() {
        let ctx = TestContext::new();
        let registered = ctx
            .services
            .auth
            .register_admin(register("asha@glow.example"))
            .await
            .unwrap();
        let claims = ctx
            .services
            .auth
            .validate_token(&registered.access_token)
            .await
            .unwrap();

        let rejected = ctx
            .services
            .auth
            .change_password(
                &claims,
                ChangePasswordRequest {
                    current_password: "Wrong-pass-1".to_string(),
                    new_password: "Another-pass-2".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(rejected.error_code(), "INVALID_CREDENTIALS");

        ctx.services
            .auth
            .change_password(
                &claims,
                ChangePasswordRequest {
                    current_password: PASSWORD.to_string(),
                    new_password: "Another-pass-2".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(ctx
            .services
            .auth
            .login(login("asha@glow.example", "Another-pass-2"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ensure_super_admin_is_idempotent() {
        let ctx = TestContext::new();
        let auth = ctx.services.auth.clone();
        assert!(auth.ensure_super_admin("Ops", "ops@trimly.example", PASSWORD).await.unwrap());
        assert!(!auth.ensure_super_admin("Ops", "ops@trimly.example", PASSWORD).await.unwrap());

        let response = auth.login(login("ops@trimly.example", PASSWORD)).await.unwrap();
        assert_eq!(response.user.role, UserRole::SuperAdmin);
        assert_eq!(response.user.tenant_id, None);
    }
}
