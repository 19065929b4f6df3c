//! Authentication API handlers
//!
//! Provides HTTP endpoints for signup, login, logout, and identity queries.

use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::auth::middleware::AuthenticatedAccount;
use crate::auth::validation::NewAccount;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studybuddy_core::AccountView;
use utoipa::ToSchema;
use uuid::Uuid;

/// Signup request body
#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub user: SignupUser,
}

/// Signup fields, nested under `user`
#[derive(Deserialize, ToSchema)]
pub struct SignupUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

impl From<SignupUser> for NewAccount {
    fn from(user: SignupUser) -> Self {
        NewAccount::new(user.email, user.password, user.password_confirmation)
    }
}

/// Login request body
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub user: LoginUser,
}

/// Login fields, nested under `user`
#[derive(Deserialize, ToSchema)]
pub struct LoginUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public account details
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
}

impl From<AccountView> for UserInfo {
    fn from(view: AccountView) -> Self {
        Self {
            id: view.id,
            email: view.email,
        }
    }
}

/// Signup and login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserInfo,
    pub token: String,
}

/// Identity response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: UserInfo,
}

/// Logout response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

fn malformed_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Register a new account
///
/// Creates the account and logs it in, returning a bearer token.
///
/// # Responses
///
/// * `201 Created` - Account created, token issued
/// * `400 Bad Request` - Body is not a `{"user": {...}}` JSON object
/// * `422 Unprocessable Entity` - Validation failed, nothing persisted
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Malformed request body", body = crate::error::ApiError),
        (status = 422, description = "User creation failed", body = crate::error::ApiError),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(malformed_body)?;
    let ctx = RequestContext::from_headers(&headers);
    let email = request.user.email.clone();

    let success = match state.auth_service.signup(request.user.into()).await {
        Ok(success) => success,
        Err(AppError::Validation(errors)) => {
            audit_log(&AuditEvent::SignupFailure {
                email,
                reasons: errors.messages().to_vec(),
                ip_address: ctx.ip_address,
                user_agent: ctx.user_agent,
            });
            return Err(AppError::Validation(errors));
        }
        Err(e) => return Err(e),
    };

    audit_log(&AuditEvent::SignupSuccess {
        user_id: success.account.id,
        email: success.account.email.clone(),
        ip_address: ctx.ip_address,
        user_agent: ctx.user_agent,
    });

    let response = AuthResponse {
        message: "User created successfully".to_string(),
        user: success.account.view().into(),
        token: success.token.token,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// # Responses
///
/// * `200 OK` - Authentication successful, token issued
/// * `401 Unauthorized` - Invalid email or password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Malformed request body", body = crate::error::ApiError),
        (status = 401, description = "Invalid email or password", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(malformed_body)?;
    let ctx = RequestContext::from_headers(&headers);
    let LoginUser { email, password } = request.user;

    let success = match state.auth_service.login(&email, &password).await {
        Ok(success) => success,
        Err(e) => {
            if matches!(e, AppError::Auth(_)) {
                audit_log(&AuditEvent::LoginFailure {
                    email,
                    ip_address: ctx.ip_address,
                    user_agent: ctx.user_agent,
                });
            }
            return Err(e);
        }
    };

    audit_log(&AuditEvent::LoginSuccess {
        user_id: success.account.id,
        email: success.account.email.clone(),
        ip_address: ctx.ip_address,
        user_agent: ctx.user_agent,
    });

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: success.account.view().into(),
        token: success.token.token,
    }))
}

/// Logout and revoke the presented token
///
/// Other tokens issued to the same account stay valid.
#[utoipa::path(
    delete,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out successfully", body = LogoutResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<AuthenticatedAccount>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(&current).await?;

    audit_log(&AuditEvent::Logout {
        user_id: current.account.id,
        email: current.account.email.clone(),
        jti: current.claims.jti.clone(),
        ip_address: RequestContext::from_headers(&headers).ip_address,
    });

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// Get the authenticated account
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated account", body = MeResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<AuthenticatedAccount>,
) -> impl IntoResponse {
    Json(MeResponse {
        user: state.auth_service.who_am_i(&current).into(),
    })
}
