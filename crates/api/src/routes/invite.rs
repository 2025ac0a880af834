//! Route definitions for the `/invites` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::invite;
use crate::state::AppState;

/// Routes mounted at `/invites`.
///
/// ```text
/// POST /{id}/accept   -> accept_invite (invitee)
/// POST /{id}/decline  -> decline_invite (invitee)
/// POST /{id}/cancel   -> cancel_invite (inviter or current captain)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/accept", post(invite::accept_invite))
        .route("/{id}/decline", post(invite::decline_invite))
        .route("/{id}/cancel", post(invite::cancel_invite))
}
