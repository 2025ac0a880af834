//! Handlers for the `/applications` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use squadhq_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/me/applications
///
/// List the caller's applications.
pub async fn my_applications(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let applications = state.positions.applications_for_user(auth.user_id).await?;
    Ok(Json(DataResponse { data: applications }))
}

/// POST /api/v1/applications/{id}/approve
///
/// Approve a pending application: the applicant joins the squad, the
/// position closes, and competing applications are rejected. Captain
/// only.
pub async fn approve_application(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(application_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .positions
        .approve_application(application_id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/applications/{id}/reject
///
/// Reject a pending application. Captain only.
pub async fn reject_application(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(application_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let application = state
        .positions
        .reject_application(application_id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: application }))
}

/// POST /api/v1/applications/{id}/withdraw
///
/// Withdraw a pending application. Applicant only.
pub async fn withdraw_application(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(application_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let application = state
        .positions
        .withdraw_application(application_id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: application }))
}
