//! Staff-side authentication controller.

use crate::{
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{created, ok, ApiResult, CreatedResult},
    state::AppState,
};
use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use tracing::debug;
use trimly_service::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RefreshTokenRequest,
    RegisterAdminRequest, UserResponse,
};

/// Creates the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/me", get(current_user))
        .route("/password", put(change_password))
}

/// Sign up a new tenant; the account starts on a trial.
async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterAdminRequest>,
) -> CreatedResult<AuthResponse> {
    debug!("Registration request for: {}", request.email);

    let response = state.services.auth.register_admin(request).await?;
    created(response)
}

/// Login with email and password.
async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    debug!("Login request for: {}", request.email);

    let response = state.services.auth.login(request).await?;
    ok(response)
}

/// Exchange a refresh token for a new pair.
async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<AuthResponse> {
    let response = state.services.auth.refresh_token(request).await?;
    ok(response)
}

async fn current_user(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<UserResponse> {
    let response = state.services.auth.current_user(&user).await?;
    ok(response)
}

async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    debug!("Password change for: {}", user.sub);

    let response = state.services.auth.change_password(&user, request).await?;
    ok(response)
}
