//! Handlers for the `/positions` resource and squad-scoped position
//! routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use squadhq_core::types::DbId;
use squadhq_db::models::position::{ApplyToPosition, CreatePosition};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/squads/{id}/positions
///
/// Publish an open position. Captain only; bounded by free slots.
pub async fn create_position(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
    Json(input): Json<CreatePosition>,
) -> AppResult<impl IntoResponse> {
    let position = state
        .positions
        .create_position(squad_id, auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: position })))
}

/// GET /api/v1/squads/{id}/positions
///
/// List a squad's open, non-expired positions.
pub async fn list_open_for_squad(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(squad_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let positions = state.positions.open_positions_for_squad(squad_id).await?;
    Ok(Json(DataResponse { data: positions }))
}

/// GET /api/v1/positions/{id}
///
/// Fetch a position.
pub async fn get_position(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(position_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let position = state.positions.get_position(position_id).await?;
    Ok(Json(DataResponse { data: position }))
}

/// DELETE /api/v1/positions/{id}
///
/// Delete a position, rejecting its pending applications. Captain only.
/// Returns 204.
pub async fn delete_position(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(position_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .positions
        .delete_position(position_id, auth.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/positions/{id}/applications
///
/// Apply to a position. Eligibility-gated.
pub async fn apply_to_position(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(position_id): Path<DbId>,
    Json(input): Json<ApplyToPosition>,
) -> AppResult<impl IntoResponse> {
    let application = state
        .positions
        .apply_to_position(position_id, auth.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: application })))
}

/// GET /api/v1/positions/{id}/applications
///
/// List a position's applications. Captain only.
pub async fn list_applications(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(position_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let applications = state
        .positions
        .applications_for_position(position_id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: applications }))
}
