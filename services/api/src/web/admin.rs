//! services/api/src/web/admin.rs
//!
//! Staff directory endpoints.

use axum::{
    extract::{Path, State},
    response::Json,
};
use dealership_core::domain::{Role, UserProfile};
use dealership_core::{require, Capability, CoreError};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::middleware::RequireSession;
use crate::web::rest::{ErrorResponse, MessageResponse};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffResponse {
    pub total_staff: usize,
    pub admin: Vec<UserProfile>,
    pub staff: Vec<UserProfile>,
}

/// GET /admin/staff - List the admin and staff accounts
#[utoipa::path(
    get,
    path = "/admin/staff",
    responses(
        (status = 200, description = "Staff directory", body = StaffResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse)
    )
)]
pub async fn list_staff_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
) -> ApiResult<Json<StaffResponse>> {
    require(&subject, Capability::ViewStaff)?;

    let (admin, staff): (Vec<UserProfile>, Vec<UserProfile>) = state
        .users
        .list_staff()
        .await?
        .iter()
        .map(UserProfile::from)
        .partition(|profile| profile.role == Role::Admin);

    Ok(Json(StaffResponse {
        total_staff: admin.len() + staff.len(),
        admin,
        staff,
    }))
}

/// DELETE /admin/delete/{staffId} - Remove a staff account
#[utoipa::path(
    delete,
    path = "/admin/delete/{staffId}",
    params(("staffId" = String, Path, description = "Staff account id")),
    responses(
        (status = 200, description = "Staff deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 403, description = "Caller is not the admin", body = ErrorResponse),
        (status = 404, description = "No staff account with that id", body = ErrorResponse)
    )
)]
pub async fn delete_staff_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
    Path(staff_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&subject, Capability::ManageStaff)?;

    let id = Uuid::parse_str(&staff_id)
        .map_err(|_| ApiError::BadRequest("Invalid Staff Id".to_string()))?;
    let Some(staff) = state.users.find_user(id).await?.filter(|u| u.role == Role::Staff) else {
        return Err(CoreError::NotFound("Staff not found".to_string()).into());
    };

    if !state.users.delete_user(id, Some(Role::Staff)).await? {
        return Err(CoreError::NotFound("Staff not found".to_string()).into());
    }
    state.sessions.revoke(&staff.email).await;
    info!(staff_id = %id, by = %subject.id, "Staff account deleted");

    Ok(MessageResponse::new(format!(
        "Staff with id '{staff_id}' deleted successfully"
    )))
}
