//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, and logout.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dealership_core::domain::{NewUser, Role};
use dealership_core::ports::PortError;
use dealership_core::{CoreError, SessionCheck};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::validation::{validate_login_inputs, validate_user_inputs, Registration};
use crate::web::middleware::{JsonBody, MaybeSession, RequireSession, TOKEN_COOKIE};
use crate::web::rest::{ErrorResponse, MessageResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Admin registration only: create the admin instead of a staff account.
    pub admin: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Hashes the password and stores the account. A taken email is a client error.
pub(crate) async fn create_account(
    state: &AppState,
    registration: Registration,
    role: Role,
) -> ApiResult<()> {
    let password_hash = state.digest.digest(&registration.password)?;
    let new_user = NewUser {
        name: registration.name,
        email: registration.email.clone(),
        password_hash,
        role,
    };
    match state.users.insert_user(new_user).await {
        Ok(user) => {
            info!(user_id = %user.id, role = %user.role, "Account created");
            Ok(())
        }
        Err(PortError::Conflict(_)) => Err(ApiError::BadRequest(format!(
            "User with email '{}' already exists",
            registration.email
        ))),
        Err(e) => Err(e.into()),
    }
}

fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={max_age_secs}"
    )
}

fn cleared_cookie() -> String {
    format!("{TOKEN_COOKIE}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0")
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a customer account
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = MessageResponse),
        (status = 200, description = "Caller already holds a live session", body = MessageResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    MaybeSession(session): MaybeSession,
    JsonBody(body): JsonBody,
) -> ApiResult<Response> {
    if session.is_valid() {
        let message = MessageResponse::new("This user is already logged in");
        return Ok((StatusCode::OK, message).into_response());
    }

    let registration = validate_user_inputs(&body)?;
    let email = registration.email.clone();
    create_account(&state, registration, Role::User).await?;

    Ok((
        StatusCode::CREATED,
        MessageResponse::new(format!("User with email '{email}' created successfully")),
    )
        .into_response())
}

/// POST /admin/register/{adminSlug} - Create a staff account, or the single admin
#[utoipa::path(
    post,
    path = "/admin/register/{adminSlug}",
    request_body = RegisterRequest,
    params(("adminSlug" = String, Path, description = "Registration secret")),
    responses(
        (status = 201, description = "Staff or admin created", body = MessageResponse),
        (status = 200, description = "Caller already holds a staff or admin session",
            body = MessageResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse),
        (status = 401, description = "Wrong slug, or an admin already exists",
            body = ErrorResponse),
        (status = 403, description = "Caller holds a customer session", body = ErrorResponse)
    )
)]
pub async fn admin_register_handler(
    State(state): State<Arc<AppState>>,
    Path(admin_slug): Path<String>,
    MaybeSession(session): MaybeSession,
    JsonBody(body): JsonBody,
) -> ApiResult<Response> {
    if let SessionCheck::Valid(subject) = &session {
        if subject.role == Role::User {
            return Err(CoreError::Forbidden.into());
        }
        return Ok((
            StatusCode::OK,
            MessageResponse::new("This admin/staff is already logged in"),
        )
            .into_response());
    }

    if admin_slug != state.config.admin_slug {
        warn!("Admin registration attempted with a wrong slug");
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }

    let registration = validate_user_inputs(&body)?;
    let role = if registration.admin {
        if state.users.find_admin().await?.is_some() {
            return Err(ApiError::Unauthorized(
                "Unauthorized, Admin User already exists".to_string(),
            ));
        }
        Role::Admin
    } else {
        Role::Staff
    };

    let email = registration.email.clone();
    create_account(&state, registration, role).await?;

    let label = if role == Role::Admin { "Admin" } else { "Staff" };
    Ok((
        StatusCode::CREATED,
        MessageResponse::new(format!("{label} with email '{email}' created successfully")),
    )
        .into_response())
}

/// POST /login - Exchange credentials for a session token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Session could not be established", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    MaybeSession(session): MaybeSession,
    JsonBody(body): JsonBody,
) -> ApiResult<Response> {
    if session.is_valid() {
        let message = MessageResponse::new("This user is already logged in");
        return Ok((StatusCode::OK, message).into_response());
    }

    let credentials = validate_login_inputs(&body)?;

    // 1. Find the account and check the password
    let Some(user) = state.users.find_user_by_email(&credentials.email).await? else {
        return Err(CoreError::InvalidCredentials.into());
    };
    if !state.digest.verify(&credentials.password, &user.password_hash)? {
        return Err(CoreError::InvalidCredentials.into());
    }

    // 2. Sign and cache the token; a refused cache write aborts the login
    let token = state.sessions.establish(&user).await?;

    // 3. Return the token, and mirror it in a cookie for browser clients
    let cookie = session_cookie(&token, state.config.jwt_expiry.as_secs());
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse { token }),
    )
        .into_response())
}

/// GET /logout - End the caller's session
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "No live session", body = ErrorResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
) -> ApiResult<Response> {
    state.sessions.revoke(&subject.email).await;
    info!(user_id = %subject.id, "Logged out");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cleared_cookie())],
        MessageResponse::new("Logged out successfully"),
    )
        .into_response())
}
