//! Route definitions for the `/applications` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::application;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// POST /{id}/approve   -> approve_application (captain)
/// POST /{id}/reject    -> reject_application (captain)
/// POST /{id}/withdraw  -> withdraw_application (applicant)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/approve", post(application::approve_application))
        .route("/{id}/reject", post(application::reject_application))
        .route("/{id}/withdraw", post(application::withdraw_application))
}
