//! Handlers for the `/squads` and `/me` squad resources.
//!
//! All endpoints require authentication via [`AuthUser`]; authorization
//! (captain, creator, membership) is enforced by the workflow layer.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use squadhq_core::types::DbId;
use squadhq_db::models::squad::{CreateSquad, UpdateSquad};
use squadhq_db::models::status::StatusId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for `POST /squads/{id}/captain`.
#[derive(Debug, Deserialize)]
pub struct TransferCaptaincyRequest {
    pub new_captain_id: DbId,
}

/// Body for `PATCH /squads/{id}/members/{user_id}/role`.
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role_id: StatusId,
}

// ---------------------------------------------------------------------------
// Squad CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/squads
///
/// Create a squad with the caller as captain and first member.
pub async fn create_squad(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSquad>,
) -> AppResult<impl IntoResponse> {
    let squad = state.squads.create_squad(auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: squad })))
}

/// GET /api/v1/squads/{id}
///
/// Fetch a squad with its member list.
pub async fn get_squad(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let squad = state.squads.get_squad(squad_id).await?;
    Ok(Json(DataResponse { data: squad }))
}

/// PATCH /api/v1/squads/{id}
///
/// Update squad metadata. Captain only.
pub async fn update_squad(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
    Json(patch): Json<UpdateSquad>,
) -> AppResult<impl IntoResponse> {
    let squad = state
        .squads
        .update_squad(squad_id, auth.user_id, patch)
        .await?;
    Ok(Json(DataResponse { data: squad }))
}

/// DELETE /api/v1/squads/{id}
///
/// Dismantle a squad. Creator or captain only. Returns 204.
pub async fn dismantle_squad(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.squads.dismantle_squad(squad_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// POST /api/v1/squads/{id}/leave
///
/// Leave a squad. The captain must transfer captaincy first.
pub async fn leave_squad(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let squad = state.squads.leave_squad(squad_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: squad }))
}

/// POST /api/v1/squads/{id}/captain
///
/// Transfer captaincy to another member. Captain only.
pub async fn transfer_captaincy(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
    Json(input): Json<TransferCaptaincyRequest>,
) -> AppResult<impl IntoResponse> {
    let squad = state
        .squads
        .transfer_captaincy(squad_id, auth.user_id, input.new_captain_id)
        .await?;
    Ok(Json(DataResponse { data: squad }))
}

/// PATCH /api/v1/squads/{id}/members/{user_id}/role
///
/// Change a member's role. Captain only.
pub async fn change_member_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((squad_id, user_id)): Path<(DbId, DbId)>,
    Json(input): Json<ChangeRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let member = state
        .squads
        .change_member_role(squad_id, auth.user_id, user_id, input.role_id)
        .await?;
    Ok(Json(DataResponse { data: member }))
}

/// DELETE /api/v1/squads/{id}/members/{user_id}
///
/// Remove a member. Captain only; the captain cannot remove themselves.
pub async fn remove_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((squad_id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let squad = state
        .squads
        .remove_member(squad_id, auth.user_id, user_id)
        .await?;
    Ok(Json(DataResponse { data: squad }))
}

// ---------------------------------------------------------------------------
// Caller-scoped reads
// ---------------------------------------------------------------------------

/// GET /api/v1/me/squads
///
/// List the squads the caller belongs to.
pub async fn my_squads(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let squads = state.squads.squads_for_user(auth.user_id).await?;
    Ok(Json(DataResponse { data: squads }))
}

/// GET /api/v1/me/squad-quota
///
/// The caller's squad-creation quota.
pub async fn my_squad_quota(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let quota = state.squads.squad_quota(auth.user_id).await?;
    Ok(Json(DataResponse { data: quota }))
}
