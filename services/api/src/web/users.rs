//! services/api/src/web/users.rs
//!
//! Self-service account endpoints for any authenticated caller.

use axum::{extract::State, response::Json};
use dealership_core::domain::{Sale, UserProfile};
use dealership_core::ports::PortError;
use dealership_core::{require, Capability, CoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::validation::validate_update_data;
use crate::web::middleware::{JsonBody, RequireSession};
use crate::web::rest::{ErrorResponse, MessageResponse};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyInfoResponse {
    pub my_info: UserProfile,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchasesResponse {
    pub total_purchases: usize,
    pub purchases: Vec<Sale>,
}

fn account_gone() -> ApiError {
    CoreError::NotFound("User not found".to_string()).into()
}

/// GET /user - The caller's own profile
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Profile", body = MyInfoResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    )
)]
pub async fn my_info_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
) -> ApiResult<Json<MyInfoResponse>> {
    let user = state
        .users
        .find_user(subject.id)
        .await?
        .ok_or_else(account_gone)?;
    Ok(Json(MyInfoResponse {
        my_info: UserProfile::from(&user),
    }))
}

/// PUT /user/update - Change name, email or password
///
/// Changing the email or password ends the current session.
#[utoipa::path(
    put,
    path = "/user/update",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorResponse),
        (status = 401, description = "No live session", body = ErrorResponse)
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<MessageResponse>> {
    let update = validate_update_data(&body)?;
    let mut user = state
        .users
        .find_user(subject.id)
        .await?
        .ok_or_else(account_gone)?;

    let old_email = user.email.clone();
    let mut credentials_changed = false;
    if let Some(name) = update.name {
        user.name = name;
    }
    if let Some(email) = update.email.filter(|email| *email != user.email) {
        user.email = email;
        credentials_changed = true;
    }
    if let Some(password) = update.password {
        user.password_hash = state.digest.digest(&password)?;
        credentials_changed = true;
    }

    match state.users.update_user(&user).await {
        Ok(true) => {}
        Ok(false) => return Err(account_gone()),
        Err(PortError::Conflict(_)) => {
            return Err(ApiError::BadRequest(format!(
                "User with email '{}' already exists",
                user.email
            )))
        }
        Err(e) => return Err(e.into()),
    }

    if credentials_changed {
        state.sessions.revoke(&old_email).await;
        info!(user_id = %user.id, "Credentials changed, session revoked");
    }
    Ok(MessageResponse::new("User data updated successfully"))
}

/// DELETE /user/delete - Close the caller's account
#[utoipa::path(
    delete,
    path = "/user/delete",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
) -> ApiResult<Json<MessageResponse>> {
    if !state.users.delete_user(subject.id, None).await? {
        return Err(account_gone());
    }
    state.sessions.revoke(&subject.email).await;
    info!(user_id = %subject.id, "Account deleted");
    Ok(MessageResponse::new("User deleted successfully"))
}

/// GET /user/purchases - Cars the caller has bought
#[utoipa::path(
    get,
    path = "/user/purchases",
    responses(
        (status = 200, description = "The caller's sales", body = PurchasesResponse),
        (status = 401, description = "No live session", body = ErrorResponse)
    )
)]
pub async fn purchases_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
) -> ApiResult<Json<PurchasesResponse>> {
    require(&subject, Capability::Purchase)?;
    let purchases = state.sales.sales_for_buyer(subject.id).await?;
    Ok(Json(PurchasesResponse {
        total_purchases: purchases.len(),
        purchases,
    }))
}
