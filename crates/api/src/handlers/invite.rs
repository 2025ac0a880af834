//! Handlers for the `/invites` resource and squad-scoped invite routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use squadhq_core::types::DbId;
use squadhq_db::models::invite::CreateInvite;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/squads/{id}/invites
///
/// Send an invite. Captain only.
pub async fn create_invite(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
    Json(input): Json<CreateInvite>,
) -> AppResult<impl IntoResponse> {
    let invite = state
        .invites
        .create_invite(squad_id, auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: invite })))
}

/// GET /api/v1/squads/{id}/invites
///
/// List a squad's invites. Captain only.
pub async fn list_for_squad(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let invites = state
        .invites
        .invites_for_squad(squad_id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: invites }))
}

/// GET /api/v1/me/invites
///
/// List the caller's incoming invites.
pub async fn my_invites(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let invites = state.invites.invites_for_user(auth.user_id).await?;
    Ok(Json(DataResponse { data: invites }))
}

/// POST /api/v1/invites/{id}/accept
///
/// Accept an invite and join the squad. Invitee only.
pub async fn accept_invite(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(invite_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let acceptance = state.invites.accept_invite(invite_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: acceptance }))
}

/// POST /api/v1/invites/{id}/decline
///
/// Decline an invite. Invitee only.
pub async fn decline_invite(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(invite_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let invite = state.invites.decline_invite(invite_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: invite }))
}

/// POST /api/v1/invites/{id}/cancel
///
/// Cancel an invite. Inviter or current captain only.
pub async fn cancel_invite(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(invite_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let invite = state.invites.cancel_invite(invite_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: invite }))
}
